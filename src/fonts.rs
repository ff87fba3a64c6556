//! Font discovery shared by the PDF renderer and the chart rasteriser.
//!
//! `genpdf` needs TrueType files for metrics and embedding, and the charts
//! need the same files to draw labels. The search order is: an explicitly
//! configured directory, `assets/fonts` next to the executable, `assets/fonts`
//! in the crate, and finally a few well-known system families.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use genpdf::error::Error;
use genpdf::fonts::{FontData, FontFamily};
use log::{debug, warn};
use rusttype::Font;

use crate::error::{ReportError, Result};

/// File names making up one font family.
#[derive(Clone, Copy, Debug)]
pub struct FamilyFiles {
    pub name: &'static str,
    pub regular: &'static str,
    pub bold: &'static str,
    pub italic: &'static str,
    pub bold_italic: &'static str,
}

impl FamilyFiles {
    fn all(&self) -> [&'static str; 4] {
        [self.regular, self.bold, self.italic, self.bold_italic]
    }
}

/// Family preferred when shipped under `assets/fonts`.
pub const ROBOTO: FamilyFiles = FamilyFiles {
    name: "Roboto",
    regular: "Roboto-Regular.ttf",
    bold: "Roboto-Bold.ttf",
    italic: "Roboto-Italic.ttf",
    bold_italic: "Roboto-BoldItalic.ttf",
};

const LIBERATION_SANS: FamilyFiles = FamilyFiles {
    name: "LiberationSans",
    regular: "LiberationSans-Regular.ttf",
    bold: "LiberationSans-Bold.ttf",
    italic: "LiberationSans-Italic.ttf",
    bold_italic: "LiberationSans-BoldItalic.ttf",
};

const DEJAVU_SANS: FamilyFiles = FamilyFiles {
    name: "DejaVuSans",
    regular: "DejaVuSans.ttf",
    bold: "DejaVuSans-Bold.ttf",
    italic: "DejaVuSans-Oblique.ttf",
    bold_italic: "DejaVuSans-BoldOblique.ttf",
};

const ARIAL_WINDOWS: FamilyFiles = FamilyFiles {
    name: "Arial",
    regular: "arial.ttf",
    bold: "arialbd.ttf",
    italic: "ariali.ttf",
    bold_italic: "arialbi.ttf",
};

const ARIAL_MACOS: FamilyFiles = FamilyFiles {
    name: "Arial",
    regular: "Arial.ttf",
    bold: "Arial Bold.ttf",
    italic: "Arial Italic.ttf",
    bold_italic: "Arial Bold Italic.ttf",
};

const BUNDLED_FAMILIES: &[FamilyFiles] = &[ROBOTO, LIBERATION_SANS, DEJAVU_SANS];

const SYSTEM_FAMILIES: &[(&str, FamilyFiles)] = &[
    ("/usr/share/fonts/truetype/liberation", LIBERATION_SANS),
    ("/usr/share/fonts/truetype/liberation2", LIBERATION_SANS),
    ("/usr/share/fonts/liberation-sans", LIBERATION_SANS),
    ("/usr/share/fonts/TTF", LIBERATION_SANS),
    ("/usr/share/fonts/truetype/dejavu", DEJAVU_SANS),
    ("/usr/share/fonts/dejavu-sans-fonts", DEJAVU_SANS),
    ("/usr/share/fonts/TTF", DEJAVU_SANS),
    ("/System/Library/Fonts/Supplemental", ARIAL_MACOS),
    ("/Library/Fonts", ARIAL_MACOS),
    ("C:\\Windows\\Fonts", ARIAL_WINDOWS),
];

/// A font family whose four style files were all found on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedFonts {
    pub name: String,
    pub directory: PathBuf,
    pub regular: PathBuf,
    pub bold: PathBuf,
    pub italic: PathBuf,
    pub bold_italic: PathBuf,
}

impl ResolvedFonts {
    fn from_directory(directory: &Path, files: &FamilyFiles) -> Option<Self> {
        let complete = files
            .all()
            .iter()
            .all(|name| directory.join(name).is_file());
        if !complete {
            return None;
        }

        Some(Self {
            name: files.name.to_owned(),
            directory: directory.to_path_buf(),
            regular: directory.join(files.regular),
            bold: directory.join(files.bold),
            italic: directory.join(files.italic),
            bold_italic: directory.join(files.bold_italic),
        })
    }

    /// Loads the family for use by `genpdf`.
    pub fn pdf_family(&self) -> std::result::Result<FontFamily<FontData>, Error> {
        Ok(FontFamily {
            regular: FontData::load(&self.regular, None)?,
            bold: FontData::load(&self.bold, None)?,
            italic: FontData::load(&self.italic, None)?,
            bold_italic: FontData::load(&self.bold_italic, None)?,
        })
    }

    /// Loads the regular and bold faces for chart labels.
    pub fn raster_fonts(&self) -> Result<RasterFonts> {
        Ok(RasterFonts {
            regular: load_raster_font(&self.regular)?,
            bold: load_raster_font(&self.bold)?,
        })
    }
}

/// Faces used when drawing text into chart images.
pub struct RasterFonts {
    pub regular: Font<'static>,
    pub bold: Font<'static>,
}

fn load_raster_font(path: &Path) -> Result<Font<'static>> {
    let bytes = fs::read(path).map_err(|err| ReportError::io(path, err))?;
    Font::try_from_vec(bytes).ok_or_else(|| ReportError::InvalidFont {
        path: path.to_path_buf(),
    })
}

/// Searches the configured and well-known font locations.
#[derive(Clone, Debug, Default)]
pub struct FontLocator {
    directory: Option<PathBuf>,
}

impl FontLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a directory that is searched before any other location.
    pub fn with_directory(mut self, directory: impl Into<Option<PathBuf>>) -> Self {
        self.directory = directory.into();
        self
    }

    fn bundled_candidates(&self) -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Some(directory) = &self.directory {
            candidates.push(directory.clone());
        }

        if let Ok(current_exe) = env::current_exe() {
            if let Some(bin_dir) = current_exe.parent() {
                let candidate = bin_dir.join("assets/fonts");
                if !candidates.contains(&candidate) {
                    candidates.push(candidate);
                }
            }
        }

        let manifest_candidate = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts");
        if !candidates.contains(&manifest_candidate) {
            candidates.push(manifest_candidate);
        }

        candidates
    }

    /// Returns the first complete font family found.
    pub fn resolve(&self) -> Result<ResolvedFonts> {
        let mut checked = Vec::new();

        for directory in self.bundled_candidates() {
            for family in BUNDLED_FAMILIES {
                if let Some(fonts) = ResolvedFonts::from_directory(&directory, family) {
                    debug!("Using {} fonts from {}", fonts.name, directory.display());
                    return Ok(fonts);
                }
            }
            checked.push(directory.display().to_string());
        }

        if let Some(directory) = &self.directory {
            warn!(
                "No complete font family in {}; falling back to system fonts",
                directory.display()
            );
        }

        for (directory, family) in SYSTEM_FAMILIES {
            let directory = Path::new(directory);
            if let Some(fonts) = ResolvedFonts::from_directory(directory, family) {
                debug!("Using system {} fonts from {}", fonts.name, directory.display());
                return Ok(fonts);
            }
            let shown = directory.display().to_string();
            if !checked.contains(&shown) {
                checked.push(shown);
            }
        }

        Err(ReportError::FontsNotFound {
            checked: checked.join(", "),
        })
    }
}

/// Indicates whether any usable font family can be found with the default search.
pub fn default_fonts_available() -> bool {
    FontLocator::new().resolve().is_ok()
}
