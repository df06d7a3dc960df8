use std::time::Duration;

use availability_intake::config::ConfigError;
use availability_intake::error::AppError;
use availability_intake::intake::gateway::DEFAULT_SIMULATED_LATENCY;
use availability_intake::intake::{
    format_identity_number, format_phone_number, validate_identity_number,
    validate_phone_number, CheckerConfig, FieldKind, IntakeWidget, SimulatedGateway,
    SimulatedPolicy, ValidationResult, WidgetOptions,
};
use clap::{Args, Subcommand};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Simulated gateway answer: random, eligible, not_eligible or fail (default eligible)
    #[arg(long)]
    pub(crate) policy: Option<String>,
    /// Simulated gateway latency in milliseconds (default 2000)
    #[arg(long)]
    pub(crate) latency_ms: Option<u64>,
    /// Address to check. Defaults to the location shortcut address.
    #[arg(long)]
    pub(crate) address: Option<String>,
    /// RUT typed into the identity field
    #[arg(long, default_value = "123456785")]
    pub(crate) rut: String,
    /// Mobile number typed into the phone field
    #[arg(long, default_value = "912345678")]
    pub(crate) phone: String,
}

#[derive(Subcommand, Debug)]
pub(crate) enum IdentifierKind {
    /// Chilean RUT, with or without separators
    Rut { value: String },
    /// Chilean mobile number
    Phone { value: String },
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        policy,
        latency_ms,
        address,
        rut,
        phone,
    } = args;

    let policy = match policy {
        Some(raw) => raw
            .parse::<SimulatedPolicy>()
            .map_err(|err| ConfigError::InvalidGatewayPolicy { value: err.0 })?,
        None => SimulatedPolicy::AlwaysEligible,
    };
    let latency = latency_ms
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_SIMULATED_LATENCY);
    let gateway = SimulatedGateway::new(latency, policy);
    let mut widget = IntakeWidget::new(WidgetOptions::embedded(), CheckerConfig::default());
    let checker = widget.checker_mut();

    println!("Availability intake demo");
    match address {
        Some(address) => checker.edit_address(address)?,
        None => checker.use_location()?,
    }
    println!(
        "  Address: {} (plausible: {})",
        checker.form().address,
        checker.is_address_plausible()
    );
    println!(
        "  Checking availability ({} ms simulated latency)...",
        latency.as_millis()
    );

    let state = checker.check_availability(&gateway).await?;
    println!("  Result: {}", state.label());
    if !state.collects_identifiers() {
        if let Some(reason) = checker.failure() {
            println!("  Failure: {reason}");
        }
        println!("\nNo contact data collected.");
        return Ok(());
    }

    checker.edit_identity_number(&rut)?;
    let rut_result = checker.finalize_identity_number()?;
    print_field(FieldKind::IdentityNumber, &checker.form().identity_number, rut_result);

    let phone_result = checker.edit_phone_number(&phone)?;
    print_field(FieldKind::PhoneNumber, &checker.form().phone_number, phone_result);

    if !checker.continue_enabled() {
        println!("\nContinue stays disabled until both fields are valid.");
        return Ok(());
    }

    let submission = checker.contact_submission()?;
    println!("\nContact submission");
    println!("  RUT: {}", submission.identity_number);
    println!("  Phone: {}", submission.phone_number);
    println!("  Address: {}", submission.address);
    println!("  Apartment: {}", submission.is_apartment);
    println!("  Outcome: {:?}", submission.outcome);
    Ok(())
}

pub(crate) fn run_validate(kind: IdentifierKind) {
    let (field, formatted, result) = match kind {
        IdentifierKind::Rut { value } => (
            FieldKind::IdentityNumber,
            format_identity_number(&value),
            validate_identity_number(&value),
        ),
        IdentifierKind::Phone { value } => (
            FieldKind::PhoneNumber,
            format_phone_number(&value),
            validate_phone_number(&value),
        ),
    };
    print_field(field, &formatted, result);
}

fn print_field(field: FieldKind, value: &str, result: ValidationResult) {
    match result {
        ValidationResult::Valid => println!("  {}: {value} (valid)", field.label()),
        ValidationResult::Invalid(reason) => {
            println!("  {}: {value} (invalid: {reason})", field.label())
        }
    }
}
