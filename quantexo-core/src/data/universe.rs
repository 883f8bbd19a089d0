//! Sector map: NEPSE sectors and their member symbols.
//!
//! Stored as TOML (`[sectors]` table of sector → symbols). The built-in
//! default is the exchange's listed universe grouped by sector; a config
//! file can replace it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("read sector map {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse sector map TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize sector map: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("unknown sector '{0}'")]
    UnknownSector(String),
}

/// Sector name → member symbols. Symbols are upper-case, sorted and unique
/// within a sector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorMap {
    pub sectors: BTreeMap<String, Vec<String>>,
}

impl SectorMap {
    pub fn new(sectors: BTreeMap<String, Vec<String>>) -> Self {
        let mut map = Self { sectors };
        map.normalize();
        map
    }

    pub fn from_file(path: &Path) -> Result<Self, UniverseError> {
        let content = std::fs::read_to_string(path).map_err(|source| UniverseError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, UniverseError> {
        let mut map: SectorMap = toml::from_str(content)?;
        map.normalize();
        Ok(map)
    }

    pub fn to_toml(&self) -> Result<String, UniverseError> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn normalize(&mut self) {
        for symbols in self.sectors.values_mut() {
            let set: BTreeSet<String> = symbols
                .iter()
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
            *symbols = set.into_iter().collect();
        }
    }

    /// Every symbol across all sectors, sorted and de-duplicated.
    pub fn all_symbols(&self) -> Vec<String> {
        let set: BTreeSet<&String> = self.sectors.values().flatten().collect();
        set.into_iter().cloned().collect()
    }

    /// First sector (alphabetically) listing `symbol`.
    pub fn sector_of(&self, symbol: &str) -> Option<&str> {
        let wanted = symbol.trim().to_uppercase();
        self.sectors
            .iter()
            .find(|(_, symbols)| symbols.binary_search(&wanted).is_ok())
            .map(|(name, _)| name.as_str())
    }

    /// Members of a sector. Sector names match case-insensitively.
    pub fn sector_symbols(&self, sector: &str) -> Result<&[String], UniverseError> {
        self.sectors
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(sector.trim()))
            .map(|(_, symbols)| symbols.as_slice())
            .ok_or_else(|| UniverseError::UnknownSector(sector.to_string()))
    }

    pub fn sector_names(&self) -> Vec<&str> {
        self.sectors.keys().map(String::as_str).collect()
    }

    pub fn symbol_count(&self) -> usize {
        self.all_symbols().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.values().all(Vec::is_empty)
    }

    /// NEPSE listed companies by sector.
    pub fn default_nepse() -> Self {
        let sectors = NEPSE_SECTORS
            .iter()
            .map(|(name, symbols)| {
                (
                    name.to_string(),
                    symbols.iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect();
        Self::new(sectors)
    }
}

const NEPSE_SECTORS: &[(&str, &[&str])] = &[
    (
        "Commercial Banks",
        &[
            "ADBL", "CZBIL", "EBL", "GBIME", "HBL", "KBL", "LSL", "MBL", "NABIL", "NBL",
            "NICA", "NIMB", "NMB", "PCBL", "PRVU", "SANIMA", "SBI", "SBL", "SCB",
        ],
    ),
    (
        "Development Banks",
        &[
            "CORBL", "EDBL", "GBBL", "GRDBL", "JBBL", "KSBBL", "LBBL", "MDB", "MLBL", "MNBBL",
            "NABBC", "SADBL", "SAPDBL", "SHINE", "SINDU",
        ],
    ),
    (
        "Finance",
        &[
            "BFC", "CFCL", "GFCL", "GMFIL", "GUFL", "ICFC", "JFL", "MFIL", "MPFL", "NFS",
            "PFL", "PROFL", "RLFL", "SFCL", "SIFC",
        ],
    ),
    (
        "Hotels",
        &[
            "CGH", "CITY", "KDL", "OHL", "SHL", "TRH",
        ],
    ),
    (
        "Hydro Power",
        &[
            "AHL", "AHPC", "AKJCL", "AKPL", "API", "BARUN", "BEDC", "BGWT", "BHDC", "BHL",
            "BHPL", "BNHC", "BPCL", "CHCL", "CHL", "CKHL", "DHPL", "DOLTI", "DORDI", "EHPL",
            "GHL", "GLH", "GVL", "HDHPC", "HHL", "HPPL", "HURJA", "IHL", "JOSHI", "KBSH",
            "KKHC", "KPCL", "LEC", "MAKAR", "MANDU", "MBJC", "MCHL", "MEHL", "MEL", "MEN",
            "MHCL", "MHL", "MHNL", "MKHC", "MKHL", "MKJC", "MMKJL", "MSHL", "NGPL", "NHDL",
            "NHPC", "NYADI", "PHCL", "PMHPL", "PPCL", "PPL", "RADHI", "RAWA", "RFPL", "RHGCL",
            "RHPL", "RIDI", "RURU", "SAHAS", "SGHC", "SHEL", "SHPC", "SIKLES", "SJCL", "SMH",
            "SMHL", "SMJC", "SPC", "SPDL", "SPHL", "SPL", "SSHL", "TAMOR", "TPC", "TSHL",
            "TVCL", "UHEWA", "ULHC", "UMHL", "UMRH", "UNHPL", "UPCL", "UPPER", "USHEC", "USHL",
            "VLUCL",
        ],
    ),
    (
        "Investment",
        &[
            "CHDC", "CIT", "ENL", "HATHY", "HIDCL", "NIFRA", "NRN",
        ],
    ),
    (
        "Life Insurance",
        &[
            "ALICL", "CLI", "CREST", "GMLI", "HLI", "ILI", "LICN", "NLIC", "NLICL", "PMLI",
            "RNLI", "SJLIC", "SNLI", "SRLI",
        ],
    ),
    (
        "Manufacturing and Processing",
        &[
            "BNL", "BNT", "GCIL", "HDL", "NLO", "OMPL", "SARBTM", "SHIVM", "SONA", "UNL",
        ],
    ),
    (
        "Microfinance",
        &[
            "ACLBSL", "ALBSL", "ANLB", "AVYAN", "CBBL", "CYCL", "DDBL", "DLBS", "FMDBL",
            "FOWAD", "GBLBS", "GILB", "GLBSL", "GMFBS", "HLBSL", "ILBS", "JBLB", "JSLBB",
            "KMCDB", "LLBS", "MATRI", "MERO", "MLBBL", "MLBS", "MLBSL", "MSLB", "NADEP",
            "NESDO", "NICLBSL", "NMBMF", "NMFBS", "NMLBBL", "NUBL", "RSDC", "SAMAJ", "SHLB",
            "SKBBL", "SLBBL", "SLBSL", "SMATA", "SMB", "SMFBS", "SMPDA", "SWBBL", "SWMF",
            "ULBSL", "UNLB", "USLB", "VLBS", "WNLB",
        ],
    ),
    (
        "Non Life Insurance",
        &[
            "HEI", "IGI", "NICL", "NIL", "NLG", "NMIC", "PRIN", "RBCL", "SALICO", "SGIC",
        ],
    ),
    (
        "Others",
        &[
            "HRL", "MKCL", "NRIC", "NRM", "NTC", "NWCL",
        ],
    ),
    (
        "Trading",
        &[
            "BBC", "STC",
        ],
    ),];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_map_has_every_sector() {
        let map = SectorMap::default_nepse();
        assert_eq!(map.sector_names().len(), 12);
        assert!(map.sector_names().contains(&"Hydro Power"));
        assert_eq!(map.symbol_count(), 245);
    }

    #[test]
    fn sector_lookup() {
        let map = SectorMap::default_nepse();
        assert_eq!(map.sector_of("nabil"), Some("Commercial Banks"));
        assert_eq!(map.sector_of("UPPER"), Some("Hydro Power"));
        assert_eq!(map.sector_of("NOPE"), None);
    }

    #[test]
    fn sector_symbols_case_insensitive() {
        let map = SectorMap::default_nepse();
        assert_eq!(map.sector_symbols("trading").unwrap(), &["BBC", "STC"]);
        assert!(matches!(
            map.sector_symbols("Crypto"),
            Err(UniverseError::UnknownSector(_))
        ));
    }

    #[test]
    fn toml_roundtrip() {
        let map = SectorMap::default_nepse();
        let text = map.to_toml().unwrap();
        let parsed = SectorMap::from_toml(&text).unwrap();
        assert_eq!(parsed, map);
    }

    #[test]
    fn load_normalizes_symbols() {
        let text = r#"
[sectors]
Banks = [" nabil", "NICA", "NABIL", ""]
"#;
        let map = SectorMap::from_toml(text).unwrap();
        assert_eq!(map.sectors["Banks"], vec!["NABIL", "NICA"]);
        assert_eq!(map.all_symbols(), vec!["NABIL", "NICA"]);
    }
}
