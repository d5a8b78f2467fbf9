//! `PICO_STATUS` values returned by every `ps4000a` entry point.

use crate::Error;

pub type Status = u32;

pub const PICO_OK: Status = 0x00;
pub const PICO_MAX_UNITS_OPENED: Status = 0x01;
pub const PICO_MEMORY_FAIL: Status = 0x02;
pub const PICO_NOT_FOUND: Status = 0x03;
pub const PICO_FW_FAIL: Status = 0x04;
pub const PICO_OPEN_OPERATION_IN_PROGRESS: Status = 0x05;
pub const PICO_OPERATION_FAILED: Status = 0x06;
pub const PICO_NOT_RESPONDING: Status = 0x07;
pub const PICO_CONFIG_FAIL: Status = 0x08;
pub const PICO_INVALID_HANDLE: Status = 0x0C;
pub const PICO_INVALID_PARAMETER: Status = 0x0D;
pub const PICO_INVALID_TIMEBASE: Status = 0x0E;
pub const PICO_INVALID_VOLTAGE_RANGE: Status = 0x0F;
pub const PICO_INVALID_CHANNEL: Status = 0x10;
pub const PICO_STREAMING_FAILED: Status = 0x14;
pub const PICO_NULL_PARAMETER: Status = 0x16;
pub const PICO_DATA_NOT_AVAILABLE: Status = 0x18;
pub const PICO_INVALID_SAMPLE_INTERVAL: Status = 0x1A;
pub const PICO_BUSY: Status = 0x27;
pub const PICO_DRIVER_FUNCTION: Status = 0x43;
pub const PICO_INVALID_SAMPLERATIO: Status = 64;
pub const PICO_INVALID_ANALOGUE_OFFSET: Status = 0x4D;
pub const PICO_POWER_SUPPLY_NOT_CONNECTED: Status = 0x119;
pub const PICO_POWER_SUPPLY_CONNECTED: Status = 0x11A;
pub const PICO_USB3_0_DEVICE_NON_USB3_0_PORT: Status = 0x11E;

pub fn name(status: Status) -> &'static str {
    match status {
        PICO_OK => "PICO_OK",
        PICO_MAX_UNITS_OPENED => "PICO_MAX_UNITS_OPENED",
        PICO_MEMORY_FAIL => "PICO_MEMORY_FAIL",
        PICO_NOT_FOUND => "PICO_NOT_FOUND",
        PICO_FW_FAIL => "PICO_FW_FAIL",
        PICO_OPEN_OPERATION_IN_PROGRESS => "PICO_OPEN_OPERATION_IN_PROGRESS",
        PICO_OPERATION_FAILED => "PICO_OPERATION_FAILED",
        PICO_NOT_RESPONDING => "PICO_NOT_RESPONDING",
        PICO_CONFIG_FAIL => "PICO_CONFIG_FAIL",
        PICO_INVALID_HANDLE => "PICO_INVALID_HANDLE",
        PICO_INVALID_PARAMETER => "PICO_INVALID_PARAMETER",
        PICO_INVALID_TIMEBASE => "PICO_INVALID_TIMEBASE",
        PICO_INVALID_VOLTAGE_RANGE => "PICO_INVALID_VOLTAGE_RANGE",
        PICO_INVALID_CHANNEL => "PICO_INVALID_CHANNEL",
        PICO_STREAMING_FAILED => "PICO_STREAMING_FAILED",
        PICO_NULL_PARAMETER => "PICO_NULL_PARAMETER",
        PICO_DATA_NOT_AVAILABLE => "PICO_DATA_NOT_AVAILABLE",
        PICO_INVALID_SAMPLE_INTERVAL => "PICO_INVALID_SAMPLE_INTERVAL",
        PICO_BUSY => "PICO_BUSY",
        PICO_DRIVER_FUNCTION => "PICO_DRIVER_FUNCTION",
        PICO_INVALID_SAMPLERATIO => "PICO_INVALID_SAMPLERATIO",
        PICO_INVALID_ANALOGUE_OFFSET => "PICO_INVALID_ANALOGUE_OFFSET",
        PICO_POWER_SUPPLY_NOT_CONNECTED => "PICO_POWER_SUPPLY_NOT_CONNECTED",
        PICO_POWER_SUPPLY_CONNECTED => "PICO_POWER_SUPPLY_CONNECTED",
        PICO_USB3_0_DEVICE_NON_USB3_0_PORT => "PICO_USB3_0_DEVICE_NON_USB3_0_PORT",
        _ => "PICO_UNKNOWN",
    }
}

/// Statuses from `ps4000aOpenUnit` that must be answered with
/// `ps4000aChangePowerSource` before the device is usable.
pub fn requires_power_change(status: Status) -> bool {
    matches!(status, PICO_POWER_SUPPLY_NOT_CONNECTED | PICO_USB3_0_DEVICE_NON_USB3_0_PORT)
}

/// Converts a status into a result, classifying well-known failures.
pub fn check(call: &'static str, status: Status) -> crate::Result<()> {
    match status {
        PICO_OK => Ok(()),
        PICO_INVALID_PARAMETER |
        PICO_INVALID_VOLTAGE_RANGE |
        PICO_INVALID_CHANNEL |
        PICO_INVALID_ANALOGUE_OFFSET |
        PICO_INVALID_SAMPLE_INTERVAL =>
            Err(Error::InvalidParameter { call, status }),
        PICO_INVALID_SAMPLERATIO =>
            Err(Error::InvalidDownsampleRatio),
        _ =>
            Err(Error::Driver { call, status }),
    }
}
