//! `FileHeader` streams of schematic files.

use crate::error::DecodeError;
use crate::mapping::{Color, FontTable, param_fields};
use crate::params::ParameterCollection;

pub const FILE_HEADER_STREAM: &str = "FileHeader";

pub const LIBRARY_HEADER: &str = "Protel for Windows - Schematic Library Editor Binary File Version 5.0";

pub const DOCUMENT_HEADER: &str = "Protel for Windows - Schematic Capture Binary File Version 5.0";

param_fields! {
    /// Library-wide settings stored in a SchLib `FileHeader`.
    pub struct LibraryHeader {
        pub minor_version: i32 = "MinorVersion",
        pub unique_id: String = "UniqueID",
        pub fonts: FontTable = "FontIdCount",
        pub use_mbcs: bool = "UseMBCS",
        pub is_boc: bool = "IsBOC",
        pub sheet_style: i32 = "SheetStyle",
        pub border_on: bool = "BorderOn",
        pub sheet_number_space_size: i32 = "SheetNumberSpaceSize",
        pub area_color: Color = "AreaColor",
        pub snap_grid_on: bool = "SnapGridOn",
        pub snap_grid_size: i32 = "SnapGridSize",
        pub visible_grid_on: bool = "VisibleGridOn",
        pub visible_grid_size: i32 = "VisibleGridSize",
        pub use_custom_sheet: bool = "UseCustomSheet",
        pub custom_x: i32 = "CustomX",
        pub custom_y: i32 = "CustomY",
        pub reference_zones_on: bool = "ReferenceZonesOn",
        pub display_unit: i32 = "Display_Unit",
    }
}

/// Check that the `HEADER` parameter names the expected file family.
///
/// Only the family part is compared, so later format versions still read.
pub(crate) fn check_header(params: &ParameterCollection<'_>, family: &str) -> Result<(), DecodeError> {
    let found = params.get("HEADER").map(|p| p.raw_value()).unwrap_or_default();
    let matches = found
        .windows(family.len())
        .any(|w| w.eq_ignore_ascii_case(family.as_bytes()));
    if matches {
        Ok(())
    } else {
        Err(DecodeError::BadHeader(String::from_utf8_lossy(found).into_owned()))
    }
}

/// Family part of [`LIBRARY_HEADER`].
pub(crate) const LIBRARY_FAMILY: &str = "Schematic Library Editor Binary File";

/// Family part of [`DOCUMENT_HEADER`].
pub(crate) const DOCUMENT_FAMILY: &str = "Schematic Capture Binary File";
