use crate::error_level::MAX_ERROR_LEVEL;
use crate::section::Section;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One audio variant: a resource handle plus the nominal logical duration the
/// fragment is allowed to play before auto-pausing. The nominal duration may
/// be shorter than the underlying media.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fragment {
    pub file: PathBuf,
    pub duration_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct SectionVariants {
    /// Indexed by error level 0-4.
    variants: Vec<Fragment>,
}

/// Static table of audio variants keyed by section (1-4) and error level
/// (0-4). External input to the engine; read-only once built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioCatalog {
    sections: Vec<SectionVariants>,
}

impl AudioCatalog {
    /// The shipped soundtrack layout. Sections 1-2 reuse the level-2 asset
    /// for levels 3-4 with a shortened cap; sections 3-4 have a distinct
    /// asset per level with a uniform duration.
    pub fn builtin() -> Self {
        fn frag(section: u8, asset_level: u8, duration_secs: f64) -> Fragment {
            Fragment {
                file: PathBuf::from(format!(
                    "assets/sounds/seccion{section}_error{asset_level}.mp3"
                )),
                duration_secs,
            }
        }
        Self {
            sections: vec![
                SectionVariants {
                    variants: vec![
                        frag(1, 0, 50.0),
                        frag(1, 1, 50.0),
                        frag(1, 2, 50.0),
                        frag(1, 2, 21.0),
                        frag(1, 2, 21.0),
                    ],
                },
                SectionVariants {
                    variants: vec![
                        frag(2, 0, 27.0),
                        frag(2, 1, 27.0),
                        frag(2, 2, 27.0),
                        frag(2, 2, 24.0),
                        frag(2, 2, 24.0),
                    ],
                },
                SectionVariants {
                    variants: (0..=MAX_ERROR_LEVEL).map(|l| frag(3, l, 35.0)).collect(),
                },
                SectionVariants {
                    variants: (0..=MAX_ERROR_LEVEL).map(|l| frag(4, l, 31.0)).collect(),
                },
            ],
        }
    }

    /// Load a catalog override from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        serde_json::from_slice(&bytes).map_err(io::Error::other)
    }

    /// Resolve (section, error level) to a fragment. `None` for the terminal
    /// section, an out-of-range level, or a hole in the table.
    pub fn resolve(&self, section: Section, level: u8) -> Option<&Fragment> {
        let idx = section.number()? as usize - 1;
        self.sections.get(idx)?.variants.get(level as usize)
    }
}

impl Default for AudioCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
