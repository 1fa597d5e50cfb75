//! Generate a deterministic sample `transactions.csv` for trying out the
//! engine. A handful of cells are deliberately malformed so the loader's
//! repair path is visible in the logs.

use chrono::{Days, NaiveDate};

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

    /// Uniform integer in `[0, bound)`.
    fn below(&mut self, bound: u64) -> u64 {
        self.next_u64() % bound
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.below(items.len() as u64) as usize]
    }
}

const STORES: [&str; 4] = ["Lyon", "Brest", "Nantes", "Toulouse"];
const PAYMENT_MODES: [&str; 4] = ["card", "cash", "voucher", "transfer"];

const CATALOG: [(&str, [&str; 4]); 3] = [
    ("Food", ["Espresso", "Croissant", "Baguette", "Quiche"]),
    ("Books", ["Atlas", "Novel", "Cookbook", "Manual"]),
    ("Garden", ["Trowel", "Seeds", "Gloves", "Watering Can"]),
];

fn main() {
    let mut rng = SimpleRng::new(42);
    let first_day = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
    let n_rows = 600u64;

    let output_path = "transactions.csv";
    let mut writer = csv::Writer::from_path(output_path).expect("Failed to create output file");
    writer
        .write_record([
            "client_id",
            "timestamp",
            "amount",
            "store",
            "category",
            "quantity",
            "payment_mode",
            "satisfaction",
            "product",
        ])
        .expect("Failed to write header");

    for row in 0..n_rows {
        let client_id = format!("C{:04}", rng.below(250));

        let day = first_day
            .checked_add_days(Days::new(rng.below(90)))
            .expect("within range");
        let timestamp = format!(
            "{day} {:02}:{:02}:{:02}",
            8 + rng.below(12),
            rng.below(60),
            rng.below(60)
        );

        let (category, products) = *rng.pick(&CATALOG);
        let product = *rng.pick(&products);

        // Skew amounts per category so the revenue views have shape.
        let base = match category {
            "Food" => 8.0,
            "Books" => 18.0,
            _ => 25.0,
        };
        let amount = format!("{:.2}", base * (0.5 + rng.next_f64() * 1.5));
        let quantity = (1 + rng.below(5)).to_string();
        let satisfaction = (1 + rng.below(5)).to_string();

        // A few malformed cells to exercise the repair path.
        let amount = if row % 97 == 0 { "n/a".to_string() } else { amount };
        let timestamp = if row % 131 == 0 { "???".to_string() } else { timestamp };

        writer
            .write_record([
                client_id.as_str(),
                timestamp.as_str(),
                amount.as_str(),
                *rng.pick(&STORES),
                category,
                quantity.as_str(),
                *rng.pick(&PAYMENT_MODES),
                satisfaction.as_str(),
                product,
            ])
            .expect("Failed to write row");
    }

    writer.flush().expect("Failed to flush output");
    println!("Wrote {n_rows} transactions to {output_path}");
}
