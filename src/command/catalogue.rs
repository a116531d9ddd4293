//! Constructors for the fixed device commands and register access.

use super::GenericCommand;

/// Characters matched by commands that take no register id.
const DEFAULT_MATCH: usize = 3;

/// Processor addressed by [`set_boot_loader`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Processor {
    /// Navigation processor.
    Nav,
    /// GNSS processor.
    Gnss,
    /// IMU processor.
    Imu,
    /// Ask which processor is active.
    Poll,
}

/// Persist the current configuration (`WNV`).
#[must_use]
pub fn write_settings() -> GenericCommand { GenericCommand::new("WNV", DEFAULT_MATCH) }

/// Restore factory defaults and reset (`RFS`).
#[must_use]
pub fn restore_factory_settings() -> GenericCommand { GenericCommand::new("RFS", DEFAULT_MATCH) }

/// Reset the device (`RST`).
#[must_use]
pub fn reset() -> GenericCommand { GenericCommand::new("RST", DEFAULT_MATCH) }

/// Enter firmware update mode (`FWU`).
#[must_use]
pub fn firmware_update() -> GenericCommand { GenericCommand::new("FWU", DEFAULT_MATCH) }

/// Tell the filter a magnetic disturbance is present or gone (`KMD`).
#[must_use]
pub fn known_magnetic_disturbance(present: bool) -> GenericCommand {
    GenericCommand::new(format!("KMD,{}", u8::from(present)), DEFAULT_MATCH)
}

/// Tell the filter an acceleration disturbance is present or gone (`KAD`).
#[must_use]
pub fn known_acceleration_disturbance(present: bool) -> GenericCommand {
    GenericCommand::new(format!("KAD,{}", u8::from(present)), DEFAULT_MATCH)
}

/// Seed the heading estimate in degrees (`SIH`).
///
/// # Examples
///
/// ```
/// use vnframe::command::catalogue::set_initial_heading;
///
/// assert_eq!(set_initial_heading(12.5).command(), "SIH,+012.500");
/// assert_eq!(set_initial_heading(-3.0).command(), "SIH,-003.000");
/// ```
#[must_use]
pub fn set_initial_heading(degrees: f32) -> GenericCommand {
    GenericCommand::new(format!("SIH,{degrees:+08.3}"), DEFAULT_MATCH)
}

/// Pause or resume asynchronous output (`ASY`).
#[must_use]
pub fn async_output_enable(enable: bool) -> GenericCommand {
    GenericCommand::new(format!("ASY,{}", u8::from(enable)), DEFAULT_MATCH)
}

/// Capture the current gyro bias (`SFB`).
#[must_use]
pub fn set_filter_bias() -> GenericCommand { GenericCommand::new("SFB", DEFAULT_MATCH) }

/// Poll binary output message `index` once (`BOM`).
#[must_use]
pub fn poll_binary_output_message(index: u8) -> GenericCommand {
    GenericCommand::new(format!("BOM,{index:02}"), DEFAULT_MATCH)
}

/// Hand control to the boot loader of `processor` (`SBL`).
#[must_use]
pub fn set_boot_loader(processor: Processor) -> GenericCommand {
    let arg = match processor {
        Processor::Nav => "0",
        Processor::Gnss => "1",
        Processor::Imu => "2",
        Processor::Poll => "?",
    };
    GenericCommand::new(format!("SBL,{arg}"), DEFAULT_MATCH)
}

fn register_match(id: u8) -> usize { if id > 99 { 7 } else { 6 } }

/// Read register `id` (`RRG`).
///
/// # Examples
///
/// ```
/// use vnframe::command::catalogue::read_register;
///
/// let command = read_register(5);
/// assert_eq!(command.command(), "RRG,05");
/// assert_eq!(command.num_chars_to_match(), 6);
/// assert_eq!(read_register(101).num_chars_to_match(), 7);
/// ```
#[must_use]
pub fn read_register(id: u8) -> GenericCommand {
    GenericCommand::new(format!("RRG,{id:02}"), register_match(id))
}

/// Write `values`, already comma separated, to register `id` (`WRG`).
#[must_use]
pub fn write_register(id: u8, values: &str) -> GenericCommand {
    GenericCommand::new(format!("WRG,{id:02},{values}"), register_match(id))
}
