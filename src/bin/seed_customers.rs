//! Customer Seeding Tool
//!
//! Creates customers through the create command handler and reports the
//! throughput. Uses the configured storage (`STORAGE`, `DATABASE_URL`).
//!
//! Run with: cargo run --bin seed_customers --release -- --count 1000

use std::time::Instant;

use getting_started::handlers::{AddressModel, CreateCustomerCommand, CustomerModel};
use getting_started::{db, AppState, Config, CustomerStatus, OperationContext, Storage};

const FIRST_NAMES: &[&str] = &["Anna", "Bram", "Chloe", "Daan", "Emma", "Finn", "Julia", "Lucas"];
const LAST_NAMES: &[&str] = &["Peeters", "Janssens", "Maes", "Jacobs", "Mertens", "Willems"];
const CITIES: &[(&str, &str)] = &[("1000", "Brussels"), ("2000", "Antwerp"), ("9000", "Ghent")];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let count: usize = args
        .iter()
        .position(|a| a == "--count")
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
        .unwrap_or(100);

    let config = Config::from_env()?;

    println!("Seed - Creating {} customers", count);

    let state = match config.storage {
        Storage::Postgres => {
            println!("Connecting to database...");
            let pool = db::connect(&config).await?;
            db::run_migrations(&pool).await?;
            AppState::postgres(pool, "seed_customers")
        }
        Storage::Memory => AppState::in_memory("seed_customers"),
    };

    let handler = state.create_handler();
    let context = OperationContext::new();
    let run = uuid::Uuid::new_v4().simple().to_string();

    let start = Instant::now();
    let mut success_count = 0usize;

    for i in 0..count {
        let first = FIRST_NAMES[i % FIRST_NAMES.len()];
        let last = LAST_NAMES[i % LAST_NAMES.len()];
        let (postal_code, city) = CITIES[i % CITIES.len()];
        let status = CustomerStatus::ALL[i % CustomerStatus::ALL.len()];

        let model = CustomerModel::new(
            first,
            last,
            &format!("{}.{}.{}.{}@example.com", first, last, &run[..8], i).to_lowercase(),
        )
        .with_status(status)
        .with_address(AddressModel::new(&format!("{} Main Street", i + 1), postal_code, city, "BE").primary());

        match handler.execute(CreateCustomerCommand::new(model), &context).await {
            Ok(_) => success_count += 1,
            Err(e) => eprintln!("Customer {} failed: {}", i, e),
        }

        if (i + 1) % 100 == 0 {
            println!("Created {} customers...", i + 1);
        }
    }

    let elapsed = start.elapsed();
    let rate = success_count as f64 / elapsed.as_secs_f64();

    println!("\n=== Seed Results ===");
    println!("Requested: {}", count);
    println!("Successful: {}", success_count);
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Rate: {:.0} customers/sec", rate);

    Ok(())
}
