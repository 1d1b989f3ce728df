// courtside entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr)
// 2. Load config (seeding config/ from defaults/ on first run)
// 3. Resolve the year range: CLI arguments or interactive prompt
// 4. Run the pipeline, rendering finished tables to stdout

use std::io::Write;

use anyhow::Context;
use tracing::info;

use courtside::config;
use courtside::pipeline;
use courtside::present::TextPresenter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("courtside starting up");

    let config = config::load_config().context("failed to load configuration")?;

    let (start_year, end_year) = read_year_range().context("failed to read year range")?;
    info!("analyzing the {start_year}-{} through {end_year}-{} seasons", short(start_year + 1), short(end_year + 1));

    let mut presenter = TextPresenter::new(std::io::stdout());
    pipeline::run(&config, start_year, end_year, &mut presenter).await?;

    info!("courtside finished");
    Ok(())
}

fn short(year: i32) -> String {
    format!("{:02}", year.rem_euclid(100))
}

/// Year range from `courtside <start> <end>`, falling back to an interactive
/// prompt. The pipeline itself only ever sees the two parsed integers.
fn read_year_range() -> anyhow::Result<(i32, i32)> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [start, end] => {
            let start = start
                .parse()
                .with_context(|| format!("start year `{start}` is not an integer"))?;
            let end = end
                .parse()
                .with_context(|| format!("end year `{end}` is not an integer"))?;
            Ok((start, end))
        }
        [] => {
            let start = prompt_year("Enter the season start year (e.g. 2012 for the 2012-13 season): ")?;
            let end = prompt_year("Enter the season end year (e.g. 2022 for the 2022-23 season): ")?;
            Ok((start, end))
        }
        _ => anyhow::bail!("usage: courtside [<start_year> <end_year>]"),
    }
}

fn prompt_year(prompt: &str) -> anyhow::Result<i32> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    line.trim()
        .parse()
        .with_context(|| format!("`{}` is not a year", line.trim()))
}

/// Initialize tracing to stderr so stdout stays clean for the rendered
/// tables.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("courtside=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
