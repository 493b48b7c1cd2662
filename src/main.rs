// Entrypoint for the restaurant picker.
// - Keeps `main` small: load the key, build the client, locate the user and
//   hand a search source to the selection loop.
// - Exit codes: 0 accepted, 2 nothing selected, 3 input closed, 1 error.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use restaurant_picker::api::{MapsClient, DEFAULT_QUERY, DEFAULT_RADIUS_METERS};
use restaurant_picker::key::{load_credential, DEFAULT_KEY_FILE};
use restaurant_picker::selector::{NearbySearch, Selection, Selector, SelectorOptions};
use restaurant_picker::ui::{self, LinePrompter, Prompter, TerminalPrompter};
use restaurant_picker::PickerError;

const EXIT_ACCEPTED: u8 = 0;
const EXIT_FAILURE: u8 = 1;
const EXIT_NO_SELECTION: u8 = 2;
const EXIT_INPUT_CLOSED: u8 = 3;

#[derive(Debug, Parser)]
#[command(name = "restaurant-picker")]
#[command(about = "Suggests random restaurants near you until one sticks")]
struct Cli {
    /// File holding the API key
    #[arg(long, env = "RESTAURANT_PICKER_KEY_FILE", default_value = DEFAULT_KEY_FILE)]
    key_file: PathBuf,

    /// Free-text search query
    #[arg(long, default_value = DEFAULT_QUERY)]
    query: String,

    /// Search radius in meters
    #[arg(long, default_value_t = DEFAULT_RADIUS_METERS)]
    radius: u32,

    /// Offer closed places from the start
    #[arg(long)]
    include_closed: bool,

    /// Fixed shuffle seed, for reproducible suggestions
    #[arg(long)]
    seed: Option<u64>,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let outcome = run(&cli);
    match &outcome {
        Ok(Selection::Accepted(_)) => {}
        Ok(Selection::Unselected(reason)) => {
            tracing::info!(?reason, "finished without a selection");
        }
        Err(err) if is_input_closed(err) => eprintln!("\nInput closed, exiting."),
        Err(err) => eprintln!("Error: {err:#}"),
    }
    ExitCode::from(exit_code(&outcome))
}

fn is_input_closed(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<PickerError>(), Some(PickerError::InputClosed))
}

fn exit_code(outcome: &anyhow::Result<Selection>) -> u8 {
    match outcome {
        Ok(Selection::Accepted(_)) => EXIT_ACCEPTED,
        Ok(Selection::Unselected(_)) => EXIT_NO_SELECTION,
        Err(err) if is_input_closed(err) => EXIT_INPUT_CLOSED,
        Err(_) => EXIT_FAILURE,
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<Selection> {
    // Key problems are fatal before any request goes out.
    let credential = load_credential(&cli.key_file)?;
    let client = MapsClient::from_env(credential)?;

    let spinner = ui::spinner("Finding your location...");
    let coordinate = client.request_location();
    spinner.finish_and_clear();
    let coordinate = coordinate.context("Could not determine your location")?;

    let mut source = NearbySearch::new(&client, coordinate, cli.query.clone(), cli.radius);
    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let options = SelectorOptions {
        include_closed: cli.include_closed,
    };

    if std::io::stdin().is_terminal() {
        pick(&mut source, &mut TerminalPrompter, rng, options)
    } else {
        let stdin = std::io::stdin().lock();
        let mut prompter = LinePrompter::new(stdin, std::io::stdout());
        pick(&mut source, &mut prompter, rng, options)
    }
}

fn pick<P: Prompter>(
    source: &mut NearbySearch<'_>,
    prompter: &mut P,
    rng: StdRng,
    options: SelectorOptions,
) -> anyhow::Result<Selection> {
    let selection = Selector::new(source, prompter, rng, options)
        .run()
        .context("Restaurant search failed")?;
    if let Selection::Accepted(place) = &selection {
        prompter.say(&ui::format_selection(place))?;
    }
    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use restaurant_picker::api::PlaceRecord;
    use restaurant_picker::selector::NoSelection;

    fn accepted() -> Selection {
        Selection::Accepted(PlaceRecord {
            name: "Taco Stand".into(),
            place_id: "ChIJ123".into(),
            formatted_address: None,
            rating: None,
            user_ratings_total: None,
            price_level: None,
            opening_hours: None,
        })
    }

    #[test]
    fn accepted_exits_zero() {
        assert_eq!(exit_code(&Ok(accepted())), 0);
    }

    #[test]
    fn every_unselected_reason_exits_two() {
        for reason in [NoSelection::NoResults, NoSelection::Exhausted, NoSelection::Declined] {
            assert_eq!(exit_code(&Ok(Selection::Unselected(reason))), 2);
        }
    }

    #[test]
    fn input_closed_under_context_exits_three() {
        let outcome: anyhow::Result<Selection> = Err(PickerError::InputClosed)
            .context("Restaurant search failed");
        assert_eq!(exit_code(&outcome), 3);
    }

    #[test]
    fn bare_input_closed_exits_three() {
        let outcome: anyhow::Result<Selection> = Err(PickerError::InputClosed.into());
        assert_eq!(exit_code(&outcome), 3);
    }

    #[test]
    fn other_errors_exit_one() {
        let outcome: anyhow::Result<Selection> = Err(PickerError::ProviderStatus {
            status: "REQUEST_DENIED".into(),
            message: None,
        })
        .context("Restaurant search failed");
        assert_eq!(exit_code(&outcome), 1);

        let plain: anyhow::Result<Selection> = Err(anyhow::anyhow!("boom"));
        assert_eq!(exit_code(&plain), 1);
    }
}
