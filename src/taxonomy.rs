//! The catalog of known EXIF fields and the category each one belongs to.
//!
//! Every field is addressed by a [`FieldKey`]: the directory it lives in plus
//! its tag code. The same code means different things in different
//! directories (`0x0001` is `GPSLatitudeRef` in the GPS IFD and
//! `InteroperabilityIndex` in the Interop IFD), so the directory is part of
//! the key.
//!
//! [`all_tags`] returns the catalog in reporting order. [`category_of`] is
//! total: a key the catalog does not know is still classified, so nothing a
//! container can hold escapes a category-based removal.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Semantic category a field is removed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Gps,
    DateTime,
    Camera,
    Software,
    /// Structural, exposure, thumbnail and free-text fields. Only removed
    /// under "remove all".
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Gps,
        Category::DateTime,
        Category::Camera,
        Category::Software,
        Category::Other,
    ];

    /// The categories a policy can toggle individually.
    pub const SELECTABLE: [Category; 4] = [
        Category::Gps,
        Category::DateTime,
        Category::Camera,
        Category::Software,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Gps => "GPS",
            Category::DateTime => "Date/Time",
            Category::Camera => "Camera",
            Category::Software => "Software",
            Category::Other => "Other",
        }
    }
}

/// Image file directory a field is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IfdGroup {
    /// IFD0, the main image directory.
    Primary,
    Exif,
    Gps,
    Interop,
    /// IFD1, the embedded thumbnail.
    Thumbnail,
}

impl IfdGroup {
    pub const ALL: [IfdGroup; 5] = [
        IfdGroup::Primary,
        IfdGroup::Exif,
        IfdGroup::Gps,
        IfdGroup::Interop,
        IfdGroup::Thumbnail,
    ];
}

impl fmt::Display for IfdGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IfdGroup::Primary => "IFD0",
            IfdGroup::Exif => "Exif",
            IfdGroup::Gps => "GPS",
            IfdGroup::Interop => "Interop",
            IfdGroup::Thumbnail => "IFD1",
        })
    }
}

/// Stable address of a field inside an EXIF container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldKey {
    pub group: IfdGroup,
    pub code: u16,
}

impl FieldKey {
    pub const fn new(group: IfdGroup, code: u16) -> Self {
        Self { group, code }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} 0x{:04X}", self.group, self.code)
    }
}

/// One catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagDescriptor {
    pub tag: Tag,
    pub key: FieldKey,
    pub display_name: &'static str,
    pub category: Category,
}

macro_rules! tag_catalog {
    ($( $variant:ident => $group:ident, $code:literal, $name:literal, $cat:ident; )*) => {
        /// Every field the catalog knows, in reporting order.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum Tag {
            $( $variant, )*
        }

        static DESCRIPTORS: &[TagDescriptor] = &[
            $(
                TagDescriptor {
                    tag: Tag::$variant,
                    key: FieldKey::new(IfdGroup::$group, $code),
                    display_name: $name,
                    category: Category::$cat,
                },
            )*
        ];
    };
}

tag_catalog! {
    // ── Image structure and orientation (IFD0) ──
    NewSubfileType => Primary, 0x00FE, "New Subfile Type", Other;
    SubfileType => Primary, 0x00FF, "Subfile Type", Other;
    ImageWidth => Primary, 0x0100, "Image Width", Other;
    ImageLength => Primary, 0x0101, "Image Length", Other;
    BitsPerSample => Primary, 0x0102, "Bits Per Sample", Other;
    Compression => Primary, 0x0103, "Compression", Other;
    PhotometricInterpretation => Primary, 0x0106, "Photometric Interpretation", Other;
    Orientation => Primary, 0x0112, "Orientation", Other;
    SamplesPerPixel => Primary, 0x0115, "Samples Per Pixel", Other;
    PlanarConfiguration => Primary, 0x011C, "Planar Configuration", Other;
    YCbCrSubSampling => Primary, 0x0212, "YCbCr Sub Sampling", Other;
    YCbCrPositioning => Primary, 0x0213, "YCbCr Positioning", Other;
    XResolution => Primary, 0x011A, "X Resolution", Other;
    YResolution => Primary, 0x011B, "Y Resolution", Other;
    ResolutionUnit => Primary, 0x0128, "Resolution Unit", Other;
    StripOffsets => Primary, 0x0111, "Strip Offsets", Other;
    RowsPerStrip => Primary, 0x0116, "Rows Per Strip", Other;
    StripByteCounts => Primary, 0x0117, "Strip Byte Counts", Other;
    TransferFunction => Primary, 0x012D, "Transfer Function", Other;
    WhitePoint => Primary, 0x013E, "White Point", Other;
    PrimaryChromaticities => Primary, 0x013F, "Primary Chromaticities", Other;
    YCbCrCoefficients => Primary, 0x0211, "YCbCr Coefficients", Other;
    ReferenceBlackWhite => Primary, 0x0214, "Reference Black White", Other;

    // ── Date and time ──
    DateTime => Primary, 0x0132, "DateTime", DateTime;
    DateTimeOriginal => Exif, 0x9003, "DateTime Original", DateTime;
    DateTimeDigitized => Exif, 0x9004, "DateTime Digitized", DateTime;
    OffsetTime => Exif, 0x9010, "Offset Time", DateTime;
    OffsetTimeOriginal => Exif, 0x9011, "Offset Time Original", DateTime;
    OffsetTimeDigitized => Exif, 0x9012, "Offset Time Digitized", DateTime;
    SubSecTime => Exif, 0x9290, "SubSec Time", DateTime;
    SubSecTimeOriginal => Exif, 0x9291, "SubSec Time Original", DateTime;
    SubSecTimeDigitized => Exif, 0x9292, "SubSec Time Digitized", DateTime;

    // ── Camera and lens identity ──
    Make => Primary, 0x010F, "Make", Camera;
    Model => Primary, 0x0110, "Model", Camera;
    BodySerialNumber => Exif, 0xA431, "Body Serial Number", Camera;
    CameraOwnerName => Exif, 0xA430, "Camera Owner Name", Camera;
    LensMake => Exif, 0xA433, "Lens Make", Camera;
    LensModel => Exif, 0xA434, "Lens Model", Camera;
    LensSerialNumber => Exif, 0xA435, "Lens Serial Number", Camera;
    LensSpecification => Exif, 0xA432, "Lens Specification", Camera;
    CameraFirmware => Exif, 0xA439, "Camera Firmware", Camera;
    UniqueCameraModel => Primary, 0xC614, "Unique Camera Model", Camera;
    LocalizedCameraModel => Primary, 0xC615, "Localized Camera Model", Camera;
    CameraSerialNumber => Primary, 0xC62F, "Camera Serial Number", Camera;

    // ── GPS ──
    GpsVersionId => Gps, 0x0000, "GPS Version ID", Gps;
    GpsLatitudeRef => Gps, 0x0001, "GPS Latitude Ref", Gps;
    GpsLatitude => Gps, 0x0002, "GPS Latitude", Gps;
    GpsLongitudeRef => Gps, 0x0003, "GPS Longitude Ref", Gps;
    GpsLongitude => Gps, 0x0004, "GPS Longitude", Gps;
    GpsAltitudeRef => Gps, 0x0005, "GPS Altitude Ref", Gps;
    GpsAltitude => Gps, 0x0006, "GPS Altitude", Gps;
    GpsTimeStamp => Gps, 0x0007, "GPS Timestamp", Gps;
    GpsSatellites => Gps, 0x0008, "GPS Satellites", Gps;
    GpsStatus => Gps, 0x0009, "GPS Status", Gps;
    GpsMeasureMode => Gps, 0x000A, "GPS Measure Mode", Gps;
    GpsDop => Gps, 0x000B, "GPS DOP", Gps;
    GpsSpeedRef => Gps, 0x000C, "GPS Speed Ref", Gps;
    GpsSpeed => Gps, 0x000D, "GPS Speed", Gps;
    GpsTrackRef => Gps, 0x000E, "GPS Track Ref", Gps;
    GpsTrack => Gps, 0x000F, "GPS Track", Gps;
    GpsImgDirectionRef => Gps, 0x0010, "GPS Img Direction Ref", Gps;
    GpsImgDirection => Gps, 0x0011, "GPS Img Direction", Gps;
    GpsMapDatum => Gps, 0x0012, "GPS Map Datum", Gps;
    GpsDestLatitudeRef => Gps, 0x0013, "GPS Dest Latitude Ref", Gps;
    GpsDestLatitude => Gps, 0x0014, "GPS Dest Latitude", Gps;
    GpsDestLongitudeRef => Gps, 0x0015, "GPS Dest Longitude Ref", Gps;
    GpsDestLongitude => Gps, 0x0016, "GPS Dest Longitude", Gps;
    GpsDestBearingRef => Gps, 0x0017, "GPS Dest Bearing Ref", Gps;
    GpsDestBearing => Gps, 0x0018, "GPS Dest Bearing", Gps;
    GpsDestDistanceRef => Gps, 0x0019, "GPS Dest Distance Ref", Gps;
    GpsDestDistance => Gps, 0x001A, "GPS Dest Distance", Gps;
    GpsProcessingMethod => Gps, 0x001B, "GPS Processing Method", Gps;
    GpsAreaInformation => Gps, 0x001C, "GPS Area Information", Gps;
    GpsDateStamp => Gps, 0x001D, "GPS Datestamp", Gps;
    GpsDifferential => Gps, 0x001E, "GPS Differential", Gps;
    GpsHPositioningError => Gps, 0x001F, "GPS H Positioning Error", Gps;

    // ── Software and authorship ──
    Software => Primary, 0x0131, "Software", Software;
    ProcessingSoftware => Primary, 0x000B, "Processing Software", Software;
    HostComputer => Primary, 0x013C, "Host Computer", Software;
    Artist => Primary, 0x013B, "Artist", Software;
    Copyright => Primary, 0x8298, "Copyright", Software;
    XpAuthor => Primary, 0x9C9D, "XP Author", Software;
    RawDevelopingSoftware => Exif, 0xA43A, "RAW Developing Software", Software;
    ImageEditingSoftware => Exif, 0xA43B, "Image Editing Software", Software;
    MetadataEditingSoftware => Exif, 0xA43C, "Metadata Editing Software", Software;

    // ── Exposure and capture settings ──
    ExposureTime => Exif, 0x829A, "Exposure Time", Other;
    FNumber => Exif, 0x829D, "F Number", Other;
    ExposureProgram => Exif, 0x8822, "Exposure Program", Other;
    SpectralSensitivity => Exif, 0x8824, "Spectral Sensitivity", Other;
    PhotographicSensitivity => Exif, 0x8827, "ISO", Other;
    Oecf => Exif, 0x8828, "OECF", Other;
    SensitivityType => Exif, 0x8830, "Sensitivity Type", Other;
    StandardOutputSensitivity => Exif, 0x8831, "Standard Output Sensitivity", Other;
    RecommendedExposureIndex => Exif, 0x8832, "Recommended Exposure Index", Other;
    IsoSpeed => Exif, 0x8833, "ISO Speed", Other;
    IsoSpeedLatitudeYyy => Exif, 0x8834, "ISO Speed Latitude yyy", Other;
    IsoSpeedLatitudeZzz => Exif, 0x8835, "ISO Speed Latitude zzz", Other;
    ShutterSpeedValue => Exif, 0x9201, "Shutter Speed Value", Other;
    ApertureValue => Exif, 0x9202, "Aperture Value", Other;
    BrightnessValue => Exif, 0x9203, "Brightness Value", Other;
    ExposureBiasValue => Exif, 0x9204, "Exposure Bias Value", Other;
    MaxApertureValue => Exif, 0x9205, "Max Aperture Value", Other;
    SubjectDistance => Exif, 0x9206, "Subject Distance", Other;
    MeteringMode => Exif, 0x9207, "Metering Mode", Other;
    LightSource => Exif, 0x9208, "Light Source", Other;
    Flash => Exif, 0x9209, "Flash", Other;
    FocalLength => Exif, 0x920A, "Focal Length", Other;
    SubjectArea => Exif, 0x9214, "Subject Area", Other;
    FlashEnergy => Exif, 0xA20B, "Flash Energy", Other;
    SpatialFrequencyResponse => Exif, 0xA20C, "Spatial Frequency Response", Other;
    FocalPlaneXResolution => Exif, 0xA20E, "Focal Plane X Resolution", Other;
    FocalPlaneYResolution => Exif, 0xA20F, "Focal Plane Y Resolution", Other;
    FocalPlaneResolutionUnit => Exif, 0xA210, "Focal Plane Resolution Unit", Other;
    SubjectLocation => Exif, 0xA214, "Subject Location", Other;
    ExposureIndex => Exif, 0xA215, "Exposure Index", Other;
    SensingMethod => Exif, 0xA217, "Sensing Method", Other;
    FileSource => Exif, 0xA300, "File Source", Other;
    SceneType => Exif, 0xA301, "Scene Type", Other;
    CfaPattern => Exif, 0xA302, "CFA Pattern", Other;
    CustomRendered => Exif, 0xA401, "Custom Rendered", Other;
    ExposureMode => Exif, 0xA402, "Exposure Mode", Other;
    WhiteBalance => Exif, 0xA403, "White Balance", Other;
    DigitalZoomRatio => Exif, 0xA404, "Digital Zoom Ratio", Other;
    FocalLengthIn35mmFilm => Exif, 0xA405, "Focal Length In 35mm Film", Other;
    SceneCaptureType => Exif, 0xA406, "Scene Capture Type", Other;
    GainControl => Exif, 0xA407, "Gain Control", Other;
    Contrast => Exif, 0xA408, "Contrast", Other;
    Saturation => Exif, 0xA409, "Saturation", Other;
    Sharpness => Exif, 0xA40A, "Sharpness", Other;
    DeviceSettingDescription => Exif, 0xA40B, "Device Setting Description", Other;
    SubjectDistanceRange => Exif, 0xA40C, "Subject Distance Range", Other;

    // ── Exif structure and image data ──
    ExifVersion => Exif, 0x9000, "EXIF Version", Other;
    FlashpixVersion => Exif, 0xA000, "Flashpix Version", Other;
    ColorSpace => Exif, 0xA001, "Color Space", Other;
    Gamma => Exif, 0xA500, "Gamma", Other;
    ComponentsConfiguration => Exif, 0x9101, "Components Configuration", Other;
    CompressedBitsPerPixel => Exif, 0x9102, "Compressed Bits Per Pixel", Other;
    PixelXDimension => Exif, 0xA002, "Pixel X Dimension", Other;
    PixelYDimension => Exif, 0xA003, "Pixel Y Dimension", Other;
    RelatedSoundFile => Exif, 0xA004, "Related Sound File", Other;
    ImageUniqueId => Exif, 0xA420, "Image Unique ID", Other;

    // ── Free text, comments and vendor blobs ──
    ImageDescription => Primary, 0x010E, "Image Description", Other;
    DocumentName => Primary, 0x010D, "Document Name", Other;
    ImageTitle => Exif, 0xA436, "Image Title", Other;
    Photographer => Exif, 0xA437, "Photographer", Other;
    ImageEditor => Exif, 0xA438, "Image Editor", Other;
    UserComment => Exif, 0x9286, "User Comment", Other;
    MakerNote => Exif, 0x927C, "Maker Note", Other;
    XpTitle => Primary, 0x9C9B, "XP Title", Other;
    XpComment => Primary, 0x9C9C, "XP Comment", Other;
    XpKeywords => Primary, 0x9C9E, "XP Keywords", Other;
    XpSubject => Primary, 0x9C9F, "XP Subject", Other;
    Rating => Primary, 0x4746, "Rating", Other;
    RatingPercent => Primary, 0x4749, "Rating Percent", Other;
    Xmp => Primary, 0x02BC, "XMP", Other;
    IptcNaa => Primary, 0x83BB, "IPTC-NAA", Other;
    PrintImageMatching => Primary, 0xC4A5, "Print Image Matching", Other;
    DngVersion => Primary, 0xC612, "DNG Version", Other;
    DefaultCropSize => Primary, 0xC620, "Default Crop Size", Other;

    // ── Interoperability ──
    InteroperabilityIndex => Interop, 0x0001, "Interoperability Index", Other;
    InteroperabilityVersion => Interop, 0x0002, "Interoperability Version", Other;
    RelatedImageFileFormat => Interop, 0x1000, "Related Image File Format", Other;
    RelatedImageWidth => Interop, 0x1001, "Related Image Width", Other;
    RelatedImageLength => Interop, 0x1002, "Related Image Length", Other;

    // ── Thumbnail (IFD1) ──
    ThumbnailImageWidth => Thumbnail, 0x0100, "Thumbnail Image Width", Other;
    ThumbnailImageLength => Thumbnail, 0x0101, "Thumbnail Image Length", Other;
    ThumbnailCompression => Thumbnail, 0x0103, "Thumbnail Compression", Other;
    ThumbnailOrientation => Thumbnail, 0x0112, "Thumbnail Orientation", Other;
    ThumbnailXResolution => Thumbnail, 0x011A, "Thumbnail X Resolution", Other;
    ThumbnailYResolution => Thumbnail, 0x011B, "Thumbnail Y Resolution", Other;
    ThumbnailResolutionUnit => Thumbnail, 0x0128, "Thumbnail Resolution Unit", Other;
    ThumbnailStripOffsets => Thumbnail, 0x0111, "Thumbnail Strip Offsets", Other;
    ThumbnailStripByteCounts => Thumbnail, 0x0117, "Thumbnail Strip Byte Counts", Other;
    ThumbnailOffset => Thumbnail, 0x0201, "Thumbnail Offset", Other;
    ThumbnailLength => Thumbnail, 0x0202, "Thumbnail Length", Other;
    ThumbnailYCbCrPositioning => Thumbnail, 0x0213, "Thumbnail YCbCr Positioning", Other;
}

static BY_KEY: LazyLock<HashMap<FieldKey, &'static TagDescriptor>> =
    LazyLock::new(|| DESCRIPTORS.iter().map(|d| (d.key, d)).collect());

impl Tag {
    pub fn descriptor(self) -> &'static TagDescriptor {
        // Variants and descriptors are generated from the same list.
        &DESCRIPTORS[self as usize]
    }

    pub fn key(self) -> FieldKey {
        self.descriptor().key
    }

    pub fn display_name(self) -> &'static str {
        self.descriptor().display_name
    }

    pub fn category(self) -> Category {
        self.descriptor().category
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// The whole catalog in reporting order.
pub fn all_tags() -> &'static [TagDescriptor] {
    DESCRIPTORS
}

/// Catalog entries of one category, in reporting order.
pub fn tags_in_category(category: Category) -> Vec<&'static TagDescriptor> {
    DESCRIPTORS.iter().filter(|d| d.category == category).collect()
}

pub fn lookup(key: FieldKey) -> Option<&'static TagDescriptor> {
    BY_KEY.get(&key).copied()
}

/// Category of any key, catalogued or not.
///
/// Uncatalogued fields in the GPS directory are location data and classify
/// as [`Category::Gps`]; everything else falls back to [`Category::Other`].
pub fn category_of(key: FieldKey) -> Category {
    match lookup(key) {
        Some(d) => d.category,
        None if key.group == IfdGroup::Gps => Category::Gps,
        None => Category::Other,
    }
}

/// Name used when reporting a field.
pub fn display_name(key: FieldKey) -> Cow<'static, str> {
    match lookup(key) {
        Some(d) => Cow::Borrowed(d.display_name),
        None => Cow::Owned(format!("Unknown tag 0x{:04X} ({})", key.code, key.group)),
    }
}
