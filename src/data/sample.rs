//! Bundled example CSV for the analysis workflow.
//!
//! The asset ships inside the binary so the download button works offline,
//! and the written file is the asset byte for byte.

use anyhow::Result;

use super::loader;
use super::model::CatchDataset;

pub const SAMPLE_FILE_NAME: &str = "data_kembung_karangantu.csv";
pub const SAMPLE_CSV: &[u8] = include_bytes!("../../data/data_kembung_karangantu.csv");

/// Parses the bundled sample with the regular CSV loader.
pub fn sample_dataset() -> Result<CatchDataset> {
    loader::load_csv_from_reader(SAMPLE_CSV)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_carries_every_optional_column() {
        let header = SAMPLE_CSV
            .split(|&b| b == b'\n')
            .next()
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .unwrap();
        for column in ["tahun", "jenis_api", "berat", "Jumlah Hari", "Nilai Produksi"] {
            assert!(header.contains(column), "header lacks {column}");
        }
    }

    #[test]
    fn download_round_trip_is_byte_identical() {
        let path = std::env::temp_dir().join("sistok-sample-roundtrip.csv");
        std::fs::write(&path, SAMPLE_CSV).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), SAMPLE_CSV);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn sample_parses_with_full_capabilities() {
        let ds = sample_dataset().unwrap();
        assert!(ds.len() > 40);
        assert!(ds.capabilities.has_year);
        assert!(ds.capabilities.has_gear);
        assert!(ds.capabilities.has_trip_days);
        assert!(ds.capabilities.has_production_value);
        // Every row in the sample carries a usable year.
        assert!(ds.records.iter().all(|rec| rec.year.is_some()));
    }
}
