//! card_consistency - credit line / billing cycle consistency simulation
//!
//! Opens a billing cycle on a handful of cards, then hammers them with
//! concurrent withdrawals and repayments while limits are reassigned and
//! cycles are closed. Every command commits against its own stream; the
//! reconciliation process carries closures over to the credit lines.

use rust_decimal::Decimal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use card_consistency::{
    AppResult, BillingCycleId, CardId, Config, Handlers, LogFormat, Money, OwnerId,
};

/// Initialize tracing/logging
fn init_tracing(format: LogFormat) {
    let registry = tracing_subscriber::registry().with(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "card_consistency=info".into()),
    );

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// A card ready for withdrawals
#[derive(Debug, Clone)]
struct Card {
    card_id: CardId,
    cycle_id: BillingCycleId,
    owner: OwnerId,
}

/// Outcome counts of a batch of commands
#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    succeeded: usize,
    rejected: usize,
    conflicted: usize,
}

impl Tally {
    fn record(&mut self, result: AppResult<()>) {
        match result {
            Ok(()) => self.succeeded += 1,
            Err(e) if e.is_conflict() => self.conflicted += 1,
            Err(e) => {
                tracing::debug!(error = %e, "Command rejected");
                self.rejected += 1;
            }
        }
    }

    fn merge(self, other: Tally) -> Tally {
        Tally {
            succeeded: self.succeeded + other.succeeded,
            rejected: self.rejected + other.rejected,
            conflicted: self.conflicted + other.conflicted,
        }
    }
}

fn open_card(handlers: &Handlers, config: &Config) -> AppResult<Card> {
    let simulation = &config.simulation;
    let card_id = handlers
        .credit_lines
        .create_card(simulation.currency.clone())?;
    handlers.credit_lines.assign_limit(
        card_id,
        &Money::new(simulation.card_limit, simulation.currency.clone()),
    )?;

    let owner = OwnerId::random();
    handlers.ownership.add_access(card_id, owner)?;
    let cycle_id = handlers.credit_lines.open_next_cycle(card_id)?;

    Ok(Card {
        card_id,
        cycle_id,
        owner,
    })
}

/// Withdraw repeatedly from one card, repaying every fourth operation
fn run_worker(handlers: Handlers, card: Card, amount: Money, operations: usize) -> Tally {
    let mut tally = Tally::default();

    for op in 0..operations {
        let result = if op % 4 == 3 {
            handlers.billing_cycles.repay(&card.cycle_id, &amount)
        } else {
            handlers
                .billing_cycles
                .withdraw(&card.cycle_id, &amount, card.owner)
        };
        tally.record(result);
    }

    tally
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    init_tracing(config.log_format);

    tracing::info!(
        environment = %config.environment,
        cards = config.simulation.cards,
        workers = config.simulation.workers,
        "Starting card consistency simulation"
    );

    let handlers = Handlers::new(config.retry_policy());

    let cards = (0..config.simulation.cards)
        .map(|_| open_card(&handlers, &config))
        .collect::<AppResult<Vec<_>>>()?;

    let amount = Money::new(
        (config.simulation.card_limit / Decimal::TEN).max(Decimal::ONE),
        config.simulation.currency.clone(),
    );

    // Withdrawal workers, several per card
    let mut workers = Vec::with_capacity(config.simulation.workers);
    for worker in 0..config.simulation.workers {
        let handlers = handlers.clone();
        let card = cards[worker % cards.len()].clone();
        let amount = amount.clone();
        let operations = config.simulation.withdrawals_per_worker;
        workers.push(tokio::task::spawn_blocking(move || {
            run_worker(handlers, card, amount, operations)
        }));
    }

    let mut withdrawals = Tally::default();
    for worker in workers {
        withdrawals = withdrawals.merge(worker.await?);
    }

    // Limit reassignment racing the closures on the credit line streams
    let raised = Money::new(
        config.simulation.card_limit * Decimal::TWO,
        config.simulation.currency.clone(),
    );
    let reassignments = {
        let handlers = handlers.clone();
        let cards = cards.clone();
        tokio::task::spawn_blocking(move || {
            let mut tally = Tally::default();
            for card in &cards {
                tally.record(handlers.credit_lines.assign_limit(card.card_id, &raised));
            }
            tally
        })
    };

    // Close every cycle; the reconciler records each closure on its card
    let mut closes = Vec::with_capacity(cards.len());
    for card in &cards {
        let handlers = handlers.clone();
        let cycle_id = card.cycle_id.clone();
        closes.push(tokio::task::spawn_blocking(move || {
            let mut tally = Tally::default();
            tally.record(handlers.billing_cycles.close(&cycle_id));
            tally
        }));
    }
    let mut closures = Tally::default();
    for close in closes {
        closures = closures.merge(close.await?);
    }
    let reassignments = reassignments.await?;

    for card in &cards {
        let state = handlers.credit_lines.credit_line(card.card_id);
        tracing::info!(
            card_id = %card.card_id,
            active = state.is_active(),
            debt = %state.debt().map(ToString::to_string).unwrap_or_default(),
            open_cycle = ?handlers.credit_lines.currently_opened_cycle(card.card_id),
            "Final credit line state"
        );
    }

    tracing::info!(
        withdrawals_succeeded = withdrawals.succeeded,
        withdrawals_rejected = withdrawals.rejected,
        withdrawals_conflicted = withdrawals.conflicted,
        reassignments_succeeded = reassignments.succeeded,
        reassignments_rejected = reassignments.rejected,
        reassignments_conflicted = reassignments.conflicted,
        closures_succeeded = closures.succeeded,
        streams = handlers.event_store.stream_count(),
        "Simulation finished"
    );

    Ok(())
}
