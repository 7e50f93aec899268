//! Writes a deterministic synthetic catch snapshot to `data_bersih.csv`,
//! the default cache path, so the app can be demoed without network access:
//! `cargo run --bin generate_sample`.

use anyhow::Result;
use chrono::{Duration, NaiveDate};

const OUTPUT_PATH: &str = "data_bersih.csv";
const TRIPS_PER_MONTH: usize = 6;

const PORTS: [&str; 4] = ["Karangantu", "Panimbang", "Labuan", "Binuangeun"];
const GEARS: [&str; 4] = ["Payang", "Bagan Perahu", "Jaring Rampus", "Pancing Ulur"];
/// (species, typical landed weight in kg, typical price in IDR/kg)
const SPECIES: [(&str, f64, f64); 5] = [
    ("Kembung", 180.0, 18_000.0),
    ("Tongkol", 260.0, 22_000.0),
    ("Layur", 120.0, 30_000.0),
    ("Teri", 90.0, 12_000.0),
    ("Cumi-Cumi", 70.0, 45_000.0),
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let mut writer = csv::Writer::from_path(OUTPUT_PATH)?;
    writer.write_record([
        "pelabuhan_kedatangan_id",
        "pelabuhan_keberangkatan_id",
        "nama_ikan_id",
        "jenis_api",
        "tanggal_berangkat",
        "tanggal_kedatangan",
        "berat",
        "nilai_produksi",
        "jumlah_hari",
    ])?;

    let mut rows = 0usize;
    for year in 2018..=2024 {
        for month in 1..=12 {
            for _ in 0..TRIPS_PER_MONTH {
                let arrival_port = rng.pick(&PORTS);
                let departure_port = rng.pick(&PORTS);
                let (species, base_kg, price) = rng.pick(&SPECIES);
                let gear = rng.pick(&GEARS);

                // Day capped at 28 so every (year, month) pair is valid.
                let day = 1 + (rng.next_u64() % 28) as u32;
                let trip_days = 1 + (rng.next_u64() % 5) as i64;
                let arrival = NaiveDate::from_ymd_opt(year, month, day)
                    .expect("synthetic date within calendar bounds");
                let departure = arrival - Duration::days(trip_days);

                let weight = rng.gauss(*base_kg, base_kg * 0.25).max(5.0);
                let value = weight * price * (0.9 + 0.2 * rng.next_f64());

                writer.write_record([
                    arrival_port.to_string(),
                    departure_port.to_string(),
                    species.to_string(),
                    gear.to_string(),
                    departure.to_string(),
                    arrival.to_string(),
                    format!("{weight:.1}"),
                    format!("{value:.0}"),
                    trip_days.to_string(),
                ])?;
                rows += 1;
            }
        }
    }
    writer.flush()?;

    println!("Wrote {rows} catch records to {OUTPUT_PATH}");
    Ok(())
}
