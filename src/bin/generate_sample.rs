use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};

/// Seeded splitmix64 stream; the same seed always yields the same CSV.
struct SalesRng(u64);

impl SalesRng {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in [0, 1).
    fn unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * f64::EPSILON / 2.0
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    /// Units per sale: a Box-Muller draw around `mean`, never below one.
    fn units(&mut self, mean: f64) -> i64 {
        let r = (-2.0 * (1.0 - self.unit()).ln()).sqrt();
        let z = r * (std::f64::consts::TAU * self.unit()).cos();
        (mean + 0.35 * mean * z).round().max(1.0) as i64
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.below(items.len() as u64) as usize]
    }
}

/// (product, unit price, mean units per sale)
const PRODUCTS: [(&str, f64, f64); 6] = [
    ("Widget", 9.5, 12.0),
    ("Gadget", 24.0, 6.0),
    ("Gizmo", 15.0, 9.0),
    ("Doohickey", 4.25, 20.0),
    ("Thingamajig", 49.0, 3.0),
    ("Whatsit", 12.0, 10.0),
];

const CATEGORIES: [&str; 4] = ["Tools", "Toys", "Garden", "Kitchen"];

const DISCOUNTS: [f64; 5] = [0.0, 0.0, 0.05, 0.1, 0.2];

fn main() -> Result<()> {
    let mut rng = SalesRng(42);
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).context("invalid start date")?;

    let output_path = "sample_sales.csv";
    let mut writer = csv::Writer::from_path(output_path)
        .with_context(|| format!("creating {output_path}"))?;
    writer.write_record([
        "product_name",
        "category",
        "units_sold",
        "revenue",
        "sale_date",
        "sale_date_num",
        "discount",
    ])?;

    let n_rows = 500;
    for _ in 0..n_rows {
        let &(product, price, mean_units) = rng.pick(&PRODUCTS);
        let category = *rng.pick(&CATEGORIES);
        let discount = *rng.pick(&DISCOUNTS);
        let day = rng.below(365) as i64;
        let units = rng.units(mean_units);
        let revenue = units as f64 * price * (1.0 - discount);
        let date = start + Duration::days(day);

        writer.write_record([
            product.to_string(),
            category.to_string(),
            units.to_string(),
            format!("{revenue:.2}"),
            date.format("%Y-%m-%d").to_string(),
            (day + 1).to_string(),
            discount.to_string(),
        ])?;
    }
    writer.flush().context("flushing sample CSV")?;

    println!("Wrote {n_rows} sales rows to {output_path}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = SalesRng(7);
        let mut b = SalesRng(7);
        let xs: Vec<u64> = (0..16).map(|_| a.next_u64()).collect();
        let ys: Vec<u64> = (0..16).map(|_| b.next_u64()).collect();
        assert_eq!(xs, ys);
        assert_ne!(xs[0], SalesRng(8).next_u64());
    }

    #[test]
    fn draws_stay_in_range() {
        let mut rng = SalesRng(42);
        for _ in 0..2_000 {
            let u = rng.unit();
            assert!((0.0..1.0).contains(&u));
            assert!(rng.below(365) < 365);
            assert!(rng.units(3.0) >= 1);
            assert!(CATEGORIES.contains(rng.pick(&CATEGORIES)));
        }
    }
}
