use std::fs;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::editor::tools::{SelectionCut, ToolBounds};

const COMMENT_KEYWORD: &str = "Comment";
const COMMENT_SEPARATOR: &str = "; ";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("source path has no file name")]
    MissingSourceName,
    #[error("selection cut is empty")]
    EmptyCut,
    #[error("malformed cut comment: {0:?}")]
    MalformedComment(String),
    #[error("no cut comment in {0}")]
    MissingComment(PathBuf),
    #[error("png encoding error: {0}")]
    Encoding(#[from] png::EncodingError),
    #[error("png decoding error: {0}")]
    Decoding(#[from] png::DecodingError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Where a cut came from, embedded in the saved file as
/// `"{source_name}; {x}; {y}; {height}; {width}"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutMetadata {
    pub source_name: String,
    pub x: i32,
    pub y: i32,
    pub height: u32,
    pub width: u32,
}

impl CutMetadata {
    pub fn new(source_name: impl Into<String>, bounds: ToolBounds) -> Self {
        Self {
            source_name: source_name.into(),
            x: bounds.x,
            y: bounds.y,
            height: bounds.height,
            width: bounds.width,
        }
    }

    pub fn bounds(&self) -> ToolBounds {
        ToolBounds::new(self.x, self.y, self.width, self.height)
    }

    pub fn comment(&self) -> String {
        [
            self.source_name.clone(),
            self.x.to_string(),
            self.y.to_string(),
            self.height.to_string(),
            self.width.to_string(),
        ]
        .join(COMMENT_SEPARATOR)
    }

    /// Parses a comment written by [`CutMetadata::comment`]. The source name
    /// may itself contain separators; the four numbers are taken from the end.
    pub fn parse(comment: &str) -> StorageResult<Self> {
        let malformed = || StorageError::MalformedComment(comment.to_string());
        let mut fields = comment.rsplitn(5, ';').map(str::trim);
        let width = fields.next().and_then(|f| f.parse().ok()).ok_or_else(malformed)?;
        let height = fields.next().and_then(|f| f.parse().ok()).ok_or_else(malformed)?;
        let y = fields.next().and_then(|f| f.parse().ok()).ok_or_else(malformed)?;
        let x = fields.next().and_then(|f| f.parse().ok()).ok_or_else(malformed)?;
        let source_name = fields.next().ok_or_else(malformed)?;
        Ok(Self {
            source_name: source_name.to_string(),
            x,
            y,
            height,
            width,
        })
    }
}

/// `scan.png` with a cut at (12, 40) becomes `scan_12_40.png` in the same
/// directory. Files without an extension get `.png`.
pub fn suggested_cut_path(source: &Path, x: i32, y: i32) -> StorageResult<PathBuf> {
    let stem = source
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .ok_or(StorageError::MissingSourceName)?;
    let extension = source
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("png");
    Ok(source.with_file_name(format!("{stem}_{x}_{y}.{extension}")))
}

pub trait CutStorage {
    fn save_cut(
        &self,
        cut: &SelectionCut,
        metadata: &CutMetadata,
        target: &Path,
    ) -> StorageResult<PathBuf>;
}

/// Writes cuts as RGBA PNG with the metadata in a `Comment` text chunk.
/// Comments outside Latin-1 go into an iTXt chunk instead of tEXt.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngCutWriter;

impl PngCutWriter {
    pub const fn new() -> Self {
        Self
    }

    /// Saves next to `source` under the suggested name.
    pub fn save_next_to_source(&self, source: &Path, cut: &SelectionCut) -> StorageResult<PathBuf> {
        let source_name = source
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or(StorageError::MissingSourceName)?;
        let metadata = CutMetadata::new(source_name, cut.bounds);
        let mut target = suggested_cut_path(source, cut.bounds.x, cut.bounds.y)?;
        target.set_extension("png");
        self.save_cut(cut, &metadata, &target)
    }

    pub fn read_metadata(&self, path: &Path) -> StorageResult<CutMetadata> {
        let file = fs::File::open(path)?;
        let decoder = png::Decoder::new(BufReader::new(file));
        let reader = decoder.read_info()?;
        let info = reader.info();
        let latin1 = info
            .uncompressed_latin1_text
            .iter()
            .find(|chunk| chunk.keyword == COMMENT_KEYWORD)
            .map(|chunk| chunk.text.clone());
        let comment = match latin1 {
            Some(text) => text,
            None => info
                .utf8_text
                .iter()
                .find(|chunk| chunk.keyword == COMMENT_KEYWORD)
                .ok_or_else(|| StorageError::MissingComment(path.to_path_buf()))?
                .get_text()?,
        };
        CutMetadata::parse(&comment)
    }
}

impl CutStorage for PngCutWriter {
    fn save_cut(
        &self,
        cut: &SelectionCut,
        metadata: &CutMetadata,
        target: &Path,
    ) -> StorageResult<PathBuf> {
        let (width, height) = cut.image.dimensions();
        if width == 0 || height == 0 {
            return Err(StorageError::EmptyCut);
        }
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Encoded in memory so a failed encode never leaves a partial file.
        let comment = metadata.comment();
        let mut bytes = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut bytes, width, height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            if is_latin1(&comment) {
                encoder.add_text_chunk(COMMENT_KEYWORD.to_string(), comment.clone())?;
            } else {
                encoder.add_itxt_chunk(COMMENT_KEYWORD.to_string(), comment.clone())?;
            }
            let mut writer = encoder.write_header()?;
            writer.write_image_data(cut.image.as_raw())?;
            writer.finish()?;
        }
        fs::write(target, &bytes)?;

        tracing::info!(path = %target.display(), %comment, "cut saved");
        Ok(target.to_path_buf())
    }
}

fn is_latin1(text: &str) -> bool {
    text.chars().all(|c| u32::from(c) <= 0xff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn sample_cut() -> SelectionCut {
        let mut image = RgbaImage::from_pixel(6, 4, Rgba([0, 0, 0, 0]));
        image.put_pixel(2, 1, Rgba([10, 20, 30, 255]));
        SelectionCut {
            image,
            bounds: ToolBounds::new(12, 40, 6, 4),
        }
    }

    #[test]
    fn comment_lists_name_then_x_y_height_width() {
        let metadata = CutMetadata::new("scan.png", ToolBounds::new(12, 40, 6, 4));
        assert_eq!(metadata.comment(), "scan.png; 12; 40; 4; 6");
        assert_eq!(CutMetadata::parse(&metadata.comment()).unwrap(), metadata);
    }

    #[test]
    fn parse_keeps_separators_inside_source_name() {
        let parsed = CutMetadata::parse("a; b.png; 1; 2; 3; 4").unwrap();
        assert_eq!(parsed.source_name, "a; b.png");
        assert_eq!(parsed.bounds(), ToolBounds::new(1, 2, 4, 3));
    }

    #[test]
    fn parse_rejects_missing_fields() {
        assert!(matches!(
            CutMetadata::parse("scan.png; 1; 2"),
            Err(StorageError::MalformedComment(_))
        ));
        assert!(CutMetadata::parse("scan.png; x; 2; 3; 4").is_err());
    }

    #[test]
    fn suggested_path_appends_offsets_before_extension() {
        assert_eq!(
            suggested_cut_path(Path::new("/data/scan.tif"), 12, 40).unwrap(),
            PathBuf::from("/data/scan_12_40.tif")
        );
        assert_eq!(
            suggested_cut_path(Path::new("page"), 0, 7).unwrap(),
            PathBuf::from("page_0_7.png")
        );
        assert!(suggested_cut_path(Path::new("/"), 0, 0).is_err());
    }

    #[test]
    fn saved_cut_round_trips_pixels_and_comment() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("scan.png");
        let writer = PngCutWriter::new();

        let saved = writer.save_next_to_source(&source, &sample_cut()).unwrap();
        assert_eq!(saved, dir.path().join("scan_12_40.png"));

        let metadata = writer.read_metadata(&saved).unwrap();
        assert_eq!(metadata.comment(), "scan.png; 12; 40; 4; 6");

        let decoded = image::open(&saved).unwrap().to_rgba8();
        assert_eq!(decoded, sample_cut().image);
    }

    #[test]
    fn non_latin1_source_name_survives_save_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("스캔.png");
        let writer = PngCutWriter::new();

        let saved = writer.save_next_to_source(&source, &sample_cut()).unwrap();
        assert_eq!(saved, dir.path().join("스캔_12_40.png"));

        let metadata = writer.read_metadata(&saved).unwrap();
        assert_eq!(metadata.source_name, "스캔.png");
        assert_eq!(metadata.bounds(), sample_cut().bounds);
        assert_eq!(image::open(&saved).unwrap().to_rgba8(), sample_cut().image);
    }

    #[test]
    fn latin1_check_covers_accented_names() {
        assert!(is_latin1("café; 1; 2; 3; 4"));
        assert!(!is_latin1("スキャン.png"));
    }

    #[test]
    fn empty_cut_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cut = SelectionCut {
            image: RgbaImage::new(0, 0),
            bounds: ToolBounds::new(0, 0, 0, 0),
        };
        let metadata = CutMetadata::new("scan.png", cut.bounds);
        let result = PngCutWriter::new().save_cut(&cut, &metadata, &dir.path().join("out.png"));
        assert!(matches!(result, Err(StorageError::EmptyCut)));
    }
}
