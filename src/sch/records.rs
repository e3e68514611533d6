//! Field declarations of every schematic record kind.

use crate::coord::{Coord, CoordPoint};
use crate::mapping::{Color, FontTable, Vertices, int_enum, param_fields};

param_fields! {
    /// Ownership fields every schematic record carries.
    ///
    /// The owner index itself is not stored here: it is a stream position
    /// recomputed from the tree on every write.
    pub struct Ownership {
        pub is_not_accessible: bool = "ISNOTACCESIBLE",
        pub index_in_sheet: i32 = "INDEXINSHEET",
        pub owner_part_id: i32 = "OWNERPARTID",
        pub owner_part_display_mode: i32 = "OWNERPARTDISPLAYMODE",
        pub graphically_locked: bool = "GRAPHICALLYLOCKED",
    }
}

/// Declare a schematic record: its `RECORD` tag and bound fields, preceded
/// by the shared [`Ownership`] fields.
macro_rules! sch_record {
    (
        $(#[$meta:meta])*
        $name:ident = $kind:literal {
            $(
                $(#[$fmeta:meta])*
                $field:ident : $ty:ty = $param:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name {
            pub common: Ownership,
            $( $(#[$fmeta])* pub $field: $ty, )*
        }

        impl $name {
            /// Value of the `RECORD` parameter
            pub const KIND: i32 = $kind;
        }

        impl $crate::mapping::ParamFields for $name {
            const PARAMS: &'static [&'static str] = &[$($param),*];

            #[allow(unused_variables)]
            fn read_fields(
                params: &$crate::params::ParameterCollection<'_>,
                encoding: &'static encoding_rs::Encoding,
            ) -> ::std::result::Result<Self, $crate::mapping::FieldError> {
                Ok(Self {
                    common: <Ownership as $crate::mapping::ParamFields>::read_fields(params, encoding)?,
                    $( $field: $crate::mapping::FieldValue::read_field(params, $param, encoding)?, )*
                })
            }

            fn write_fields(&self, w: &mut $crate::params::ParameterWriter<'_>) {
                $crate::mapping::ParamFields::write_fields(&self.common, w);
                $( $crate::mapping::write_value(&self.$field, $param, w); )*
            }
        }
    };
}

int_enum! {
    /// Electrical type of a pin.
    pub enum PinElectrical {
        Input = 0,
        InputOutput = 1,
        Output = 2,
        OpenCollector = 3,
        Passive = 4,
        HiZ = 5,
        OpenEmitter = 6,
        Power = 7,
    }
}

int_enum! {
    pub enum LineWidth {
        Smallest = 0,
        Small = 1,
        Medium = 2,
        Large = 3,
    }
}

int_enum! {
    pub enum LineStyle {
        Solid = 0,
        Dashed = 1,
        Dotted = 2,
        DashDotted = 3,
    }
}

int_enum! {
    /// Anchor of a text item relative to its location.
    pub enum TextJustification {
        BottomLeft = 0,
        BottomCenter = 1,
        BottomRight = 2,
        MiddleLeft = 3,
        MiddleCenter = 4,
        MiddleRight = 5,
        TopLeft = 6,
        TopCenter = 7,
        TopRight = 8,
    }
}

int_enum! {
    /// Rotation in quarter turns.
    pub enum Orientation {
        Degrees0 = 0,
        Degrees90 = 1,
        Degrees180 = 2,
        Degrees270 = 3,
    }
}

int_enum! {
    pub enum PowerPortStyle {
        Circle = 0,
        Arrow = 1,
        Bar = 2,
        Wave = 3,
        PowerGround = 4,
        SignalGround = 5,
        Earth = 6,
        GostArrow = 7,
        GostPowerGround = 8,
        GostEarth = 9,
        GostBar = 10,
    }
}

int_enum! {
    pub enum PortIoType {
        Unspecified = 0,
        Output = 1,
        Input = 2,
        Bidirectional = 3,
    }
}

/// Bits of a pin's `PINCONGLOMERATE` field.
pub mod pin_flags {
    pub const ROTATED: i32 = 0x01;
    pub const FLIPPED: i32 = 0x02;
    pub const HIDDEN: i32 = 0x04;
    pub const SHOW_NAME: i32 = 0x08;
    pub const SHOW_DESIGNATOR: i32 = 0x10;
    pub const GRAPHICALLY_LOCKED: i32 = 0x40;
}

sch_record! {
    /// Symbol instance; heads a library storage and owns its primitives.
    Component = 1 {
        lib_reference: String = "LIBREFERENCE",
        description: String = "COMPONENTDESCRIPTION",
        part_count: i32 = "PARTCOUNT",
        display_mode_count: i32 = "DISPLAYMODECOUNT",
        display_mode: i32 = "DISPLAYMODE",
        current_part_id: i32 = "CURRENTPARTID",
        location: CoordPoint = "LOCATION",
        orientation: Orientation = "ORIENTATION",
        is_mirrored: bool = "ISMIRRORED",
        part_id_locked: bool = "PARTIDLOCKED",
        library_path: String = "LIBRARYPATH",
        source_library_name: String = "SOURCELIBRARYNAME",
        sheet_part_file_name: String = "SHEETPARTFILENAME",
        target_file_name: String = "TARGETFILENAME",
        design_item_id: String = "DESIGNITEMID",
        unique_id: String = "UNIQUEID",
        area_color: Color = "AREACOLOR",
        color: Color = "COLOR",
        component_kind: i32 = "COMPONENTKIND",
        all_pin_count: i32 = "ALLPINCOUNT",
    }
}

sch_record! {
    Pin = 2 {
        location: CoordPoint = "LOCATION",
        length: Coord = "PINLENGTH",
        electrical: PinElectrical = "ELECTRICAL",
        /// Orientation and visibility bits, see [`pin_flags`]
        conglomerate: i32 = "PINCONGLOMERATE",
        symbol_inner_edge: i32 = "SYMBOL_INNEREDGE",
        symbol_outer_edge: i32 = "SYMBOL_OUTEREDGE",
        symbol_inner: i32 = "SYMBOL_INNER",
        symbol_outer: i32 = "SYMBOL_OUTER",
        formal_type: i32 = "FORMALTYPE",
        name: String = "NAME",
        designator: String = "DESIGNATOR",
        description: String = "DESCRIPTION",
        swap_id_pin: String = "SWAPIDPIN",
        swap_id_part_pin: String = "SWAPIDPARTPIN",
        default_value: String = "DEFAULTVALUE",
        color: Color = "COLOR",
    }
}

impl Pin {
    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.conglomerate & pin_flags::HIDDEN != 0
    }

    #[inline]
    pub fn shows_name(&self) -> bool {
        self.conglomerate & pin_flags::SHOW_NAME != 0
    }

    #[inline]
    pub fn shows_designator(&self) -> bool {
        self.conglomerate & pin_flags::SHOW_DESIGNATOR != 0
    }
}

sch_record! {
    Label = 4 {
        location: CoordPoint = "LOCATION",
        color: Color = "COLOR",
        font_id: i32 = "FONTID",
        orientation: Orientation = "ORIENTATION",
        justification: TextJustification = "JUSTIFICATION",
        is_mirrored: bool = "ISMIRRORED",
        text: String = "TEXT",
    }
}

sch_record! {
    Bezier = 5 {
        line_width: LineWidth = "LINEWIDTH",
        color: Color = "COLOR",
        vertices: Vertices = "LOCATIONCOUNT",
    }
}

sch_record! {
    Polyline = 6 {
        line_width: LineWidth = "LINEWIDTH",
        line_style: LineStyle = "LINESTYLE",
        color: Color = "COLOR",
        start_line_shape: i32 = "STARTLINESHAPE",
        end_line_shape: i32 = "ENDLINESHAPE",
        line_shape_size: i32 = "LINESHAPESIZE",
        vertices: Vertices = "LOCATIONCOUNT",
    }
}

sch_record! {
    Polygon = 7 {
        line_width: LineWidth = "LINEWIDTH",
        color: Color = "COLOR",
        area_color: Color = "AREACOLOR",
        is_solid: bool = "ISSOLID",
        transparent: bool = "TRANSPARENT",
        vertices: Vertices = "LOCATIONCOUNT",
    }
}

sch_record! {
    Ellipse = 8 {
        location: CoordPoint = "LOCATION",
        radius: Coord = "RADIUS",
        secondary_radius: Coord = "SECONDARYRADIUS",
        line_width: LineWidth = "LINEWIDTH",
        color: Color = "COLOR",
        area_color: Color = "AREACOLOR",
        is_solid: bool = "ISSOLID",
        transparent: bool = "TRANSPARENT",
    }
}

sch_record! {
    RoundRectangle = 10 {
        location: CoordPoint = "LOCATION",
        corner: CoordPoint = "CORNER",
        corner_x_radius: Coord = "CORNERXRADIUS",
        corner_y_radius: Coord = "CORNERYRADIUS",
        line_width: LineWidth = "LINEWIDTH",
        color: Color = "COLOR",
        area_color: Color = "AREACOLOR",
        is_solid: bool = "ISSOLID",
        transparent: bool = "TRANSPARENT",
    }
}

sch_record! {
    EllipticalArc = 11 {
        location: CoordPoint = "LOCATION",
        radius: Coord = "RADIUS",
        secondary_radius: Coord = "SECONDARYRADIUS",
        start_angle: f64 = "STARTANGLE",
        end_angle: f64 = "ENDANGLE",
        line_width: LineWidth = "LINEWIDTH",
        color: Color = "COLOR",
    }
}

sch_record! {
    Arc = 12 {
        location: CoordPoint = "LOCATION",
        radius: Coord = "RADIUS",
        start_angle: f64 = "STARTANGLE",
        end_angle: f64 = "ENDANGLE",
        line_width: LineWidth = "LINEWIDTH",
        color: Color = "COLOR",
    }
}

sch_record! {
    Line = 13 {
        location: CoordPoint = "LOCATION",
        corner: CoordPoint = "CORNER",
        line_width: LineWidth = "LINEWIDTH",
        line_style: LineStyle = "LINESTYLE",
        color: Color = "COLOR",
    }
}

sch_record! {
    Rectangle = 14 {
        location: CoordPoint = "LOCATION",
        corner: CoordPoint = "CORNER",
        line_width: LineWidth = "LINEWIDTH",
        color: Color = "COLOR",
        area_color: Color = "AREACOLOR",
        is_solid: bool = "ISSOLID",
        transparent: bool = "TRANSPARENT",
    }
}

sch_record! {
    PowerPort = 17 {
        location: CoordPoint = "LOCATION",
        color: Color = "COLOR",
        style: PowerPortStyle = "STYLE",
        orientation: Orientation = "ORIENTATION",
        show_net_name: bool = "SHOWNETNAME",
        is_cross_sheet_connector: bool = "ISCROSSSHEETCONNECTOR",
        font_id: i32 = "FONTID",
        text: String = "TEXT",
    }
}

sch_record! {
    Port = 18 {
        location: CoordPoint = "LOCATION",
        width: Coord = "WIDTH",
        height: Coord = "HEIGHT",
        style: i32 = "STYLE",
        io_type: PortIoType = "IOTYPE",
        alignment: i32 = "ALIGNMENT",
        color: Color = "COLOR",
        area_color: Color = "AREACOLOR",
        text_color: Color = "TEXTCOLOR",
        font_id: i32 = "FONTID",
        name: String = "NAME",
        harness_type: String = "HARNESSTYPE",
        unique_id: String = "UNIQUEID",
    }
}

sch_record! {
    NoErc = 22 {
        location: CoordPoint = "LOCATION",
        color: Color = "COLOR",
        orientation: Orientation = "ORIENTATION",
        symbol: i32 = "SYMBOL",
        is_active: bool = "ISACTIVE",
        suppress_all: bool = "SUPPRESSALL",
    }
}

sch_record! {
    NetLabel = 25 {
        location: CoordPoint = "LOCATION",
        color: Color = "COLOR",
        font_id: i32 = "FONTID",
        orientation: Orientation = "ORIENTATION",
        justification: TextJustification = "JUSTIFICATION",
        is_mirrored: bool = "ISMIRRORED",
        text: String = "TEXT",
    }
}

sch_record! {
    Bus = 26 {
        line_width: LineWidth = "LINEWIDTH",
        color: Color = "COLOR",
        vertices: Vertices = "LOCATIONCOUNT",
    }
}

sch_record! {
    Wire = 27 {
        line_width: LineWidth = "LINEWIDTH",
        color: Color = "COLOR",
        vertices: Vertices = "LOCATIONCOUNT",
        unique_id: String = "UNIQUEID",
    }
}

sch_record! {
    TextFrame = 28 {
        location: CoordPoint = "LOCATION",
        corner: CoordPoint = "CORNER",
        line_width: LineWidth = "LINEWIDTH",
        color: Color = "COLOR",
        area_color: Color = "AREACOLOR",
        text_color: Color = "TEXTCOLOR",
        font_id: i32 = "FONTID",
        is_solid: bool = "ISSOLID",
        show_border: bool = "SHOWBORDER",
        alignment: i32 = "ALIGNMENT",
        word_wrap: bool = "WORDWRAP",
        clip_to_rect: bool = "CLIPTORECT",
        text_margin: Coord = "TEXTMARGIN",
        text: String = "TEXT",
    }
}

sch_record! {
    Junction = 29 {
        location: CoordPoint = "LOCATION",
        color: Color = "COLOR",
        locked: bool = "LOCKED",
    }
}

sch_record! {
    /// Sheet settings and font table; the first record of a document.
    Sheet = 31 {
        fonts: FontTable = "FONTIDCOUNT",
        use_mbcs: bool = "USEMBCS",
        is_boc: bool = "ISBOC",
        hot_spot_grid_on: bool = "HOTSPOTGRIDON",
        hot_spot_grid_size: i32 = "HOTSPOTGRIDSIZE",
        sheet_style: i32 = "SHEETSTYLE",
        system_font: i32 = "SYSTEMFONT",
        border_on: bool = "BORDERON",
        title_block_on: bool = "TITLEBLOCKON",
        sheet_number_space_size: i32 = "SHEETNUMBERSPACESIZE",
        area_color: Color = "AREACOLOR",
        snap_grid_on: bool = "SNAPGRIDON",
        snap_grid_size: i32 = "SNAPGRIDSIZE",
        visible_grid_on: bool = "VISIBLEGRIDON",
        visible_grid_size: i32 = "VISIBLEGRIDSIZE",
        use_custom_sheet: bool = "USECUSTOMSHEET",
        custom_x: i32 = "CUSTOMX",
        custom_y: i32 = "CUSTOMY",
        reference_zones_on: bool = "REFERENCEZONESON",
        display_unit: i32 = "DISPLAY_UNIT",
        workspace_orientation: i32 = "WORKSPACEORIENTATION",
    }
}

sch_record! {
    Designator = 34 {
        location: CoordPoint = "LOCATION",
        color: Color = "COLOR",
        font_id: i32 = "FONTID",
        orientation: Orientation = "ORIENTATION",
        justification: TextJustification = "JUSTIFICATION",
        is_mirrored: bool = "ISMIRRORED",
        is_hidden: bool = "ISHIDDEN",
        read_only_state: i32 = "READONLYSTATE",
        name: String = "NAME",
        text: String = "TEXT",
    }
}

sch_record! {
    /// A named property attached to its owner.
    Parameter = 41 {
        location: CoordPoint = "LOCATION",
        color: Color = "COLOR",
        font_id: i32 = "FONTID",
        orientation: Orientation = "ORIENTATION",
        justification: TextJustification = "JUSTIFICATION",
        is_mirrored: bool = "ISMIRRORED",
        is_hidden: bool = "ISHIDDEN",
        show_name: bool = "SHOWNAME",
        read_only_state: i32 = "READONLYSTATE",
        param_type: i32 = "PARAMTYPE",
        name: String = "NAME",
        text: String = "TEXT",
        unique_id: String = "UNIQUEID",
    }
}

sch_record! {
    ImplementationList = 44 {}
}

sch_record! {
    /// A model (footprint, simulation, ...) linked to a component.
    Implementation = 45 {
        model_name: String = "MODELNAME",
        model_type: String = "MODELTYPE",
        description: String = "DESCRIPTION",
        is_current: bool = "ISCURRENT",
        use_component_library: bool = "USECOMPONENTLIBRARY",
        data_links_locked: bool = "DATALINKSLOCKED",
        database_data_links_locked: bool = "DATABASEDATALINKSLOCKED",
        data_file_count: i32 = "DATAFILECOUNT",
        data_file_entity: String = "MODELDATAFILEENTITY0",
        data_file_kind: String = "MODELDATAFILEKIND0",
        unique_id: String = "UNIQUEID",
    }
}

sch_record! {
    MapDefinerList = 46 {
        is_trivial: bool = "ISTRIVIAL",
    }
}

sch_record! {
    /// Maps one symbol pin to model pins.
    MapDefiner = 47 {
        interface: String = "DESINTF",
        implementation_count: i32 = "DESIMPCOUNT",
        implementation: String = "DESIMP0",
        is_trivial: bool = "ISTRIVIAL",
    }
}

sch_record! {
    ImplementationParameters = 48 {}
}
