//! Texture atlases in the Spine / libGDX `.atlas` text format.
//!
//! An atlas file lists one or more pages (image files), each followed by the
//! named regions packed into it:
//!
//! ```text
//! hero.png
//! size: 64, 32
//! filter: Linear, Linear
//! idle1
//!   bounds: 0, 0, 16, 16
//! idle2
//!   bounds: 16, 0, 16, 16
//!   rotate: 90
//! ```
//!
//! Pages are separated by blank lines. Regions sharing a name form an
//! indexed group (animation frames); the index comes from an `index:` key
//! or, with auto-indexing, from trailing digits in the name.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use crate::coords::Vec2;

use super::instance::TexRect;
use super::stamp::Stamp;
use super::texture::{SamplerOptions, StampTexture, TextureFilter, TextureWrap};
use super::StampError;

/// One image of an atlas.
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasPage {
    /// Image file name, relative to the atlas file.
    pub name: String,
    /// Declared pixel size, if the file states one.
    pub size: Option<(u32, u32)>,
    pub options: SamplerOptions,
    /// Pixels are stored with premultiplied alpha.
    pub premultiplied: bool,
}

/// One named sub-image of a page.
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasRegion {
    pub name: String,
    /// Position in its group, as declared.
    pub index: Option<usize>,
    /// Index into [`AtlasDesc::pages`].
    pub page: usize,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Trim offsets: x, y, original width, original height.
    pub offsets: [u32; 4],
    /// Radians.
    pub rotate: f32,
}

impl AtlasRegion {
    /// Normalized sub-rectangle on a `tex_w` x `tex_h` page.
    pub fn tex_rect(&self, tex_w: u32, tex_h: u32) -> TexRect {
        TexRect::from_pixels(self.x, self.y, self.width, self.height, tex_w, tex_h)
    }
}

/// A region name's content: one item, or frames by index (with gaps).
#[derive(Debug, Clone, PartialEq)]
pub enum AtlasEntry<T> {
    Single(T),
    Indexed(Vec<Option<T>>),
}

impl<T> AtlasEntry<T> {
    #[inline]
    pub fn is_indexed(&self) -> bool {
        matches!(self, AtlasEntry::Indexed(_))
    }

    /// The single item, or the lowest-indexed frame present.
    pub fn first(&self) -> Option<&T> {
        match self {
            AtlasEntry::Single(t) => Some(t),
            AtlasEntry::Indexed(frames) => frames.iter().flatten().next(),
        }
    }

    /// Frame `index`, wrapped around the frame count so a running counter
    /// can drive an animation. `None` for a gap. Single entries ignore
    /// `index`.
    pub fn frame(&self, index: usize) -> Option<&T> {
        match self {
            AtlasEntry::Single(t) => Some(t),
            AtlasEntry::Indexed(frames) if frames.is_empty() => None,
            AtlasEntry::Indexed(frames) => frames[index % frames.len()].as_ref(),
        }
    }

    /// Number of slots, gaps included.
    pub fn len(&self) -> usize {
        match self {
            AtlasEntry::Single(_) => 1,
            AtlasEntry::Indexed(frames) => frames.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Present items in index order.
    pub fn items(&self) -> Vec<&T> {
        match self {
            AtlasEntry::Single(t) => vec![t],
            AtlasEntry::Indexed(frames) => frames.iter().flatten().collect(),
        }
    }

    /// Closes gaps, renumbering the remaining frames from 0.
    pub fn remove_empty(&mut self) {
        if let AtlasEntry::Indexed(frames) = self {
            frames.retain(Option::is_some);
        }
    }

    fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> AtlasEntry<U> {
        match self {
            AtlasEntry::Single(t) => AtlasEntry::Single(f(t)),
            AtlasEntry::Indexed(frames) => {
                AtlasEntry::Indexed(frames.iter().map(|fr| fr.as_ref().map(&mut f)).collect())
            }
        }
    }
}

/// Parsed atlas file, before any image is loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasDesc {
    pub pages: Vec<AtlasPage>,
    pub regions: BTreeMap<String, AtlasEntry<AtlasRegion>>,
}

/// Parses atlas text.
///
/// With `auto_index`, trailing digits of a region name become its index
/// (`walk3` is frame 3 of `walk`).
pub fn parse_atlas(text: &str, auto_index: bool) -> Result<AtlasDesc, StampError> {
    let mut raw: Vec<RawPage> = Vec::new();
    let mut in_page = false;

    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        let l = line.trim();
        if l.is_empty() {
            in_page = false;
            continue;
        }

        match l.split_once(':') {
            None if in_page => {
                if let Some(page) = raw.last_mut() {
                    page.regions.push(Block::new(line_no, l));
                }
            }
            None => {
                if raw.iter().any(|p| p.block.name == l) {
                    return Err(atlas_error(line_no, format!("page '{l}' already exists")));
                }
                raw.push(RawPage {
                    block: Block::new(line_no, l),
                    regions: Vec::new(),
                });
                in_page = true;
            }
            Some((key, value)) => {
                let page = raw
                    .last_mut()
                    .filter(|_| in_page)
                    .ok_or_else(|| atlas_error(line_no, "key before a page name"))?;
                let block = page.regions.last_mut().unwrap_or(&mut page.block);
                block.insert(line_no, key.trim(), value.trim())?;
            }
        }
    }

    let mut pages = Vec::with_capacity(raw.len());
    let mut found = Vec::new();
    for (page_index, rp) in raw.iter().enumerate() {
        pages.push(parse_page(&rp.block)?);
        for rb in &rp.regions {
            found.push((rb.line, parse_region(rb, page_index, auto_index)?));
        }
    }

    Ok(AtlasDesc {
        pages,
        regions: group_regions(found)?,
    })
}

/// Named stamps over one or more loaded atlas pages.
#[derive(Debug, Clone)]
pub struct TextureAtlas {
    pages: Vec<Arc<StampTexture>>,
    regions: BTreeMap<String, AtlasEntry<Stamp>>,
}

impl TextureAtlas {
    /// Reads an atlas file and loads its pages from the same directory.
    pub fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: impl AsRef<Path>,
        auto_index: bool,
    ) -> Result<Self, StampError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| StampError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let desc = parse_atlas(&text, auto_index)?;

        let dir = path.parent().unwrap_or(Path::new(""));
        let pages = desc
            .pages
            .iter()
            .map(|p| StampTexture::from_path(device, queue, dir.join(&p.name), p.options, None))
            .collect::<Result<Vec<_>, _>>()?;

        let atlas = Self::from_desc(&desc, pages);
        log::info!(
            "atlas {} loaded: {} pages, {} regions",
            path.display(),
            atlas.pages.len(),
            atlas.regions.len()
        );
        Ok(atlas)
    }

    /// Builds stamps for `desc` over already uploaded pages.
    ///
    /// Texture coordinates use the real page size; a differing declared
    /// size is logged.
    ///
    /// # Panics
    /// If `pages` does not hold one texture per `desc.pages` entry.
    pub fn from_desc(desc: &AtlasDesc, pages: Vec<Arc<StampTexture>>) -> Self {
        assert_eq!(
            pages.len(),
            desc.pages.len(),
            "TextureAtlas::from_desc: one texture per page required"
        );

        for (page, tex) in desc.pages.iter().zip(&pages) {
            if let Some(size) = page.size {
                if size != (tex.width(), tex.height()) {
                    log::warn!(
                        "atlas page {} declares {}x{} but the image is {}x{}",
                        page.name,
                        size.0,
                        size.1,
                        tex.width(),
                        tex.height()
                    );
                }
            }
        }

        let regions = desc
            .regions
            .iter()
            .map(|(name, entry)| (name.clone(), entry.map(|r| region_stamp(r, &pages[r.page]))))
            .collect();

        Self { pages, regions }
    }

    pub fn get(&self, name: &str) -> Option<&AtlasEntry<Stamp>> {
        self.regions.get(name)
    }

    /// First stamp of `name`.
    pub fn stamp(&self, name: &str) -> Option<&Stamp> {
        self.get(name)?.first()
    }

    /// Region names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }

    pub fn pages(&self) -> &[Arc<StampTexture>] {
        &self.pages
    }

    /// Closes index gaps in every group.
    pub fn remove_empty_indices(&mut self) {
        for entry in self.regions.values_mut() {
            entry.remove_empty();
        }
    }
}

/// Pinned at the top-left, natural size, rotated as declared.
fn region_stamp(region: &AtlasRegion, page: &Arc<StampTexture>) -> Stamp {
    let rect = region.tex_rect(page.width(), page.height());
    let size = Vec2::new(region.width as f32, region.height as f32);
    let mut stamp = Stamp::from_region(Arc::clone(page), rect, size);
    stamp.params.rotate(region.rotate);
    stamp
}

struct RawPage {
    block: Block,
    regions: Vec<Block>,
}

/// A name line and the `key: value` lines under it.
struct Block {
    line: usize,
    name: String,
    keys: HashMap<String, String>,
}

impl Block {
    fn new(line: usize, name: &str) -> Self {
        Self {
            line,
            name: name.to_string(),
            keys: HashMap::new(),
        }
    }

    fn insert(&mut self, line: usize, key: &str, value: &str) -> Result<(), StampError> {
        if self.keys.contains_key(key) {
            return Err(atlas_error(line, format!("key '{key}' repeated in '{}'", self.name)));
        }
        self.keys.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.keys.get(key).map(String::as_str)
    }

    /// Exactly `n` comma-separated unsigned ints, if the key is present.
    fn uints(&self, key: &str, n: usize) -> Result<Option<Vec<u32>>, StampError> {
        let Some(v) = self.get(key) else {
            return Ok(None);
        };
        let parsed: Result<Vec<u32>, _> = v.split(',').map(|p| p.trim().parse::<u32>()).collect();
        match parsed {
            Ok(vals) if vals.len() == n => Ok(Some(vals)),
            _ => Err(atlas_error(
                self.line,
                format!("'{key}' of '{}' needs {n} unsigned integers, got '{v}'", self.name),
            )),
        }
    }
}

fn atlas_error(line: usize, reason: impl Into<String>) -> StampError {
    StampError::Atlas {
        line,
        reason: reason.into(),
    }
}

fn parse_page(block: &Block) -> Result<AtlasPage, StampError> {
    let size = block.uints("size", 2)?.map(|v| (v[0], v[1]));

    let mut options = SamplerOptions::default();
    if let Some(filter) = block.get("filter") {
        let names: Vec<&str> = filter.split(',').collect();
        let min = names.first().copied().unwrap_or("");
        let mag = names.last().copied().unwrap_or("");
        options.min_filter = parse_filter(min, block.line)?;
        options.mag_filter = parse_filter(mag, block.line)?;
    }

    let repeat = block.get("repeat").unwrap_or("").to_ascii_lowercase();
    if repeat.contains('x') {
        options.wrap_u = TextureWrap::Repeat;
    }
    if repeat.contains('y') {
        options.wrap_v = TextureWrap::Repeat;
    }

    Ok(AtlasPage {
        name: block.name.clone(),
        size,
        options,
        premultiplied: parse_bool(block.get("pma")),
    })
}

/// Filter within the base level. Pages have no mip chain, so the mipmap
/// variants reduce to their in-level filter.
fn parse_filter(name: &str, line: usize) -> Result<TextureFilter, StampError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "" | "nearest" | "mipmapnearestnearest" | "mipmapnearestlinear" => Ok(TextureFilter::Nearest),
        "linear" | "mipmap" | "mipmaplinearnearest" | "mipmaplinearlinear" => Ok(TextureFilter::Linear),
        other => Err(atlas_error(line, format!("unknown filter '{other}'"))),
    }
}

fn parse_bool(value: Option<&str>) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if v == "true" => true,
        Some(v) => v.parse::<i64>().is_ok_and(|n| n != 0),
        None => false,
    }
}

fn parse_region(block: &Block, page: usize, auto_index: bool) -> Result<AtlasRegion, StampError> {
    let stripped = strip_image_ext(&block.name);
    let (name, auto) = if auto_index {
        split_frame_index(stripped)
    } else {
        (stripped.to_string(), None)
    };

    let declared = match block.get("index") {
        None => None,
        Some(v) => match v.trim().parse::<i64>() {
            Ok(-1) => None,
            Ok(i) if i >= 0 => Some(i as usize),
            _ => return Err(atlas_error(block.line, format!("bad index '{v}' for '{name}'"))),
        },
    };
    if let (Some(a), Some(d)) = (auto, declared) {
        if a != d {
            return Err(atlas_error(
                block.line,
                format!("'{}' is index {a} by name but declares index {d}", block.name),
            ));
        }
    }

    let [x, y, width, height] = match block.uints("bounds", 4)? {
        Some(b) => [b[0], b[1], b[2], b[3]],
        None => match (block.uints("xy", 2)?, block.uints("size", 2)?) {
            (Some(xy), Some(size)) => [xy[0], xy[1], size[0], size[1]],
            _ => return Err(atlas_error(block.line, format!("region '{}' has no bounds", block.name))),
        },
    };

    let offsets = match block.uints("offsets", 4)? {
        Some(o) => [o[0], o[1], o[2], o[3]],
        None => [0, 0, width, height],
    };

    Ok(AtlasRegion {
        name,
        index: auto.or(declared),
        page,
        x,
        y,
        width,
        height,
        offsets,
        rotate: parse_rotate(block.get("rotate")).to_radians(),
    })
}

/// Degrees. `true` is a quarter turn; anything unparsable is none.
fn parse_rotate(value: Option<&str>) -> f32 {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if v == "true" => 90.0,
        Some(v) => v.parse::<f32>().unwrap_or(0.0),
        None => 0.0,
    }
}

fn strip_image_ext(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if matches!(ext.to_ascii_lowercase().as_str(), "png" | "gif" | "jpg") => stem,
        _ => name,
    }
}

/// `"walk/3"` -> `("walk", Some(3))`; trims separators left around the name.
fn split_frame_index(name: &str) -> (String, Option<usize>) {
    let stem = name.trim_end_matches(|c: char| c.is_ascii_digit());
    let digits = &name[stem.len()..];
    let stem = stem.trim_matches(|c| c == '/' || c == '\\' || c == ' ');
    (stem.to_string(), digits.parse().ok())
}

fn group_regions(
    found: Vec<(usize, AtlasRegion)>,
) -> Result<BTreeMap<String, AtlasEntry<AtlasRegion>>, StampError> {
    let mut groups: BTreeMap<String, Vec<(usize, AtlasRegion)>> = BTreeMap::new();
    for (line, region) in found {
        groups.entry(region.name.clone()).or_default().push((line, region));
    }

    let mut out = BTreeMap::new();
    for (name, members) in groups {
        if members.len() == 1 && members[0].1.index.is_none() {
            if let Some((_, region)) = members.into_iter().next() {
                out.insert(name, AtlasEntry::Single(region));
            }
            continue;
        }

        let mut frames: Vec<Option<AtlasRegion>> = Vec::new();
        for (line, region) in members {
            let Some(i) = region.index else {
                return Err(atlas_error(line, format!("region '{name}' repeats without an index")));
            };
            if frames.len() <= i {
                frames.resize_with(i + 1, || None);
            }
            if frames[i].is_some() {
                return Err(atlas_error(line, format!("region '{name}' has index {i} twice")));
            }
            frames[i] = Some(region);
        }
        out.insert(name, AtlasEntry::Indexed(frames));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const SAMPLE: &str = "
hero.png
size: 64, 32
filter: Linear, Nearest
repeat: x
pma: true
idle1.png
  bounds: 0, 0, 16, 16
idle2.png
  bounds: 16, 0, 16, 16
  rotate: 90
coin
  xy: 32, 0
  size: 8, 8
  offsets: 1, 2, 10, 10

tiles.png
size: 32, 32
wall
  bounds: 0, 0, 32, 32
run
  bounds: 0, 0, 8, 8
  index: 0
run
  bounds: 8, 0, 8, 8
  index: 2
";

    fn error_line(text: &str) -> usize {
        match parse_atlas(text, false) {
            Err(StampError::Atlas { line, .. }) => line,
            other => panic!("expected an atlas error, got {other:?}"),
        }
    }

    #[test]
    fn pages_carry_size_and_sampling() {
        let desc = parse_atlas(SAMPLE, false).unwrap();
        assert_eq!(desc.pages.len(), 2);

        let hero = &desc.pages[0];
        assert_eq!(hero.name, "hero.png");
        assert_eq!(hero.size, Some((64, 32)));
        assert_eq!(hero.options.min_filter, TextureFilter::Linear);
        assert_eq!(hero.options.mag_filter, TextureFilter::Nearest);
        assert_eq!(hero.options.wrap_u, TextureWrap::Repeat);
        assert_eq!(hero.options.wrap_v, TextureWrap::ClampToEdge);
        assert!(hero.premultiplied);

        let tiles = &desc.pages[1];
        assert_eq!(tiles.options, SamplerOptions::default());
        assert!(!tiles.premultiplied);
    }

    #[test]
    fn regions_keep_bounds_offsets_and_rotation() {
        let desc = parse_atlas(SAMPLE, false).unwrap();
        let names: Vec<_> = desc.regions.keys().map(String::as_str).collect();
        assert_eq!(names, ["coin", "idle1", "idle2", "run", "wall"]);

        let Some(AtlasEntry::Single(coin)) = desc.regions.get("coin") else {
            panic!("coin should be a single region");
        };
        assert_eq!((coin.x, coin.y, coin.width, coin.height), (32, 0, 8, 8));
        assert_eq!(coin.offsets, [1, 2, 10, 10]);
        assert_eq!(coin.page, 0);

        let idle2 = desc.regions["idle2"].first().unwrap();
        assert!((idle2.rotate - FRAC_PI_2).abs() < 1e-6);

        let wall = desc.regions["wall"].first().unwrap();
        assert_eq!(wall.page, 1);
        assert_eq!(wall.offsets, [0, 0, 32, 32]);
    }

    #[test]
    fn declared_indices_group_frames_with_gaps() {
        let desc = parse_atlas(SAMPLE, false).unwrap();
        let run = &desc.regions["run"];
        assert!(run.is_indexed());
        assert_eq!(run.len(), 3);
        assert_eq!(run.frame(0).map(|r| r.x), Some(0));
        assert_eq!(run.frame(1), None);
        assert_eq!(run.frame(2).map(|r| r.x), Some(8));
        assert_eq!(run.items().len(), 2);
    }

    #[test]
    fn auto_index_reads_trailing_digits() {
        let mut desc = parse_atlas(SAMPLE, true).unwrap();
        assert!(!desc.regions.contains_key("idle1"));

        let idle = desc.regions.get_mut("idle").unwrap();
        assert_eq!(idle.len(), 3);
        assert_eq!(idle.frame(0), None);
        assert_eq!(idle.frame(1).map(|r| r.x), Some(0));
        // wraps, so a frame counter can index directly
        assert_eq!(idle.frame(4).map(|r| r.x), Some(0));

        idle.remove_empty();
        assert_eq!(idle.len(), 2);
        assert_eq!(idle.frame(0).map(|r| r.x), Some(0));
        assert_eq!(idle.frame(1).map(|r| r.x), Some(16));
        assert_eq!(idle.first().map(|r| r.x), Some(0));
    }

    #[test]
    fn region_tex_rect_is_normalized_to_the_page() {
        let desc = parse_atlas(SAMPLE, false).unwrap();
        let idle2 = desc.regions["idle2"].first().unwrap();
        assert_eq!(idle2.tex_rect(64, 32), TexRect::new(0.25, 0.0, 0.5, 0.5));
    }

    #[test]
    fn frame_names_split_from_their_index() {
        assert_eq!(split_frame_index("walk3"), ("walk".to_string(), Some(3)));
        assert_eq!(split_frame_index("walk/12"), ("walk".to_string(), Some(12)));
        assert_eq!(split_frame_index("wall"), ("wall".to_string(), None));
        assert_eq!(strip_image_ext("a.PNG"), "a");
        assert_eq!(strip_image_ext("a.b"), "a.b");
    }

    #[test]
    fn malformed_atlases_report_the_line() {
        assert_eq!(error_line("size: 1, 1\n"), 1);
        assert_eq!(error_line("p.png\nsize: 1, 1\nsize: 2, 2\n"), 3);
        assert_eq!(error_line("p.png\n\np.png\n"), 3);
        assert_eq!(error_line("p.png\nr\n  bounds: 0, 0, 1\n"), 2);
        assert_eq!(error_line("p.png\nr\n  rotate: 90\n"), 2);
        assert_eq!(error_line("p.png\nfilter: Bilinear\n"), 1);
        assert_eq!(error_line("p.png\nr\n bounds: 0,0,1,1\nr\n bounds: 1,0,1,1\n"), 2);
    }

    #[test]
    fn auto_index_must_agree_with_declared_index() {
        let text = "p.png\nrun2\n  bounds: 0, 0, 1, 1\n  index: 3\n";
        assert!(parse_atlas(text, false).is_ok());
        assert!(matches!(parse_atlas(text, true), Err(StampError::Atlas { line: 2, .. })));
    }

    #[test]
    fn duplicate_frame_index_is_rejected() {
        let text = "p.png\nr\n bounds: 0,0,1,1\n index: 1\nr\n bounds: 1,0,1,1\n index: 1\n";
        assert!(matches!(parse_atlas(text, false), Err(StampError::Atlas { line: 5, .. })));
    }

    #[test]
    fn pma_accepts_numbers() {
        assert!(parse_bool(Some("1")));
        assert!(!parse_bool(Some("0")));
        assert!(!parse_bool(Some("nope")));
        assert!(!parse_bool(None));
    }
}
