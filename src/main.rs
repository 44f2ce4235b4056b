use anyhow::Result;

fn main() -> Result<()> {
    // Load .env early; ignore if missing.
    dotenvy::dotenv().ok();

    botdash::run()
}
