/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! wwv-tx – WWV time-code transmitter
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── timecode/       – timestamp → frame symbols → pulse commands (pure)
//! ├── pulse           – pulse commands, tick/slot timing, modulation
//! ├── pin/            – PinOutput trait + sysfs / trace / recording backends
//! ├── gate/           – TransmissionGate: one transmission at a time
//! ├── control/        – device-style sessions and verb dispatch
//! └── config/         – YAML transmitter configuration
//! ```

pub mod config;
pub mod control;
pub mod gate;
pub mod pin;
pub mod pulse;
pub mod timecode;
