//! Interactive intake flow: drives the wizard session through prompts, pumps
//! the debounced side-channels between fields, and hands the review step off
//! to the submission path.

use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};

use crate::api::{EstimateApi, VehicleApi};
use crate::domain::{ClearanceType, ModelCatalog, Terminal, VehicleRecord};
use crate::errors::CliError;
use crate::time::Clock;
use crate::wizard::{Advance, EstimateState, IntakeWizard, Step, SubmitError, VinAvailability};

use super::io::format_naira;

/// Responses a free-text prompt can produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    Value(String),
    Back,
    Cancel,
}

/// Responses a choice prompt can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceOutcome {
    Picked(usize),
    Back,
    Cancel,
}

/// Interaction surface the intake flow is driven through, so tests can feed
/// scripted responses instead of a terminal.
pub trait IntakeIo {
    fn prompt_text(&mut self, label: &str, default: Option<&str>) -> Result<PromptOutcome, CliError>;

    fn prompt_choice(
        &mut self,
        label: &str,
        options: &[String],
        default: Option<usize>,
        allow_back: bool,
    ) -> Result<ChoiceOutcome, CliError>;

    fn confirm(&mut self, question: &str) -> Result<bool, CliError>;

    fn print_line(&mut self, line: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Cancelled,
}

enum ReviewFlow {
    Submitted(Box<VehicleRecord>),
    Continue,
    Cancelled,
}

/// Drives one wizard session end to end against the remote collaborators.
pub struct IntakeRunner<'a> {
    wizard: IntakeWizard,
    estimate_api: &'a dyn EstimateApi,
    vehicle_api: &'a dyn VehicleApi,
    clock: &'a dyn Clock,
    io: &'a mut dyn IntakeIo,
    poll_sleep: std::time::Duration,
}

impl<'a> IntakeRunner<'a> {
    pub fn new(
        catalog: ModelCatalog,
        quiet_period: Duration,
        estimate_api: &'a dyn EstimateApi,
        vehicle_api: &'a dyn VehicleApi,
        clock: &'a dyn Clock,
        io: &'a mut dyn IntakeIo,
    ) -> Self {
        Self {
            wizard: IntakeWizard::new(catalog, quiet_period),
            estimate_api,
            vehicle_api,
            clock,
            io,
            poll_sleep: std::time::Duration::from_millis(50),
        }
    }

    /// Replaces the debounce polling sleep, mainly for tests with a zero
    /// quiet period.
    pub fn with_poll_sleep(mut self, sleep: std::time::Duration) -> Self {
        self.poll_sleep = sleep;
        self
    }

    pub fn wizard(&self) -> &IntakeWizard {
        &self.wizard
    }

    /// Runs the wizard until it is submitted or abandoned. Returns the
    /// created record, or `None` when the operator cancels.
    pub fn run(&mut self) -> Result<Option<VehicleRecord>, CliError> {
        loop {
            let step = self.wizard.step();
            self.io.print_line(&format!(
                "Step {} of {} – {}",
                step.index() + 1,
                Step::ORDER.len(),
                step.title()
            ));
            let flow = match step {
                Step::ClearanceType => self.step_clearance()?,
                Step::VehicleInformation => self.step_vehicle_info()?,
                Step::ShippingDetails => self.step_shipping()?,
                Step::CostDetermination => self.step_costs()?,
                Step::Review => match self.step_review()? {
                    ReviewFlow::Submitted(record) => return Ok(Some(*record)),
                    ReviewFlow::Continue => Flow::Continue,
                    ReviewFlow::Cancelled => Flow::Cancelled,
                },
            };
            if flow == Flow::Cancelled {
                self.wizard.cancel_side_channels();
                return Ok(None);
            }
        }
    }

    fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Issues due side-channel requests until the debouncers settle. The
    /// guard bounds a frozen clock to a finite number of passes.
    fn drain_side_channels(&mut self) {
        let mut guard = 0usize;
        loop {
            let now = self.clock.now();
            let work = self.wizard.pump(now);
            if let Some(key) = work.estimate {
                let outcome =
                    self.estimate_api
                        .global_search(&key.make, &key.model, key.year, key.terminal);
                self.wizard.resolve_estimate(&key, outcome);
            }
            if let Some(vin) = work.vin {
                let outcome = self.vehicle_api.vin_exists(&vin);
                self.wizard.resolve_vin(&vin, outcome);
            }
            if !self.wizard.has_pending_debounce() {
                break;
            }
            guard += 1;
            if guard >= 512 {
                break;
            }
            if !self.poll_sleep.is_zero() {
                std::thread::sleep(self.poll_sleep);
            }
        }
    }

    fn advance(&mut self) {
        if self.wizard.next(self.today()) == Advance::Blocked {
            self.print_field_errors();
        }
    }

    fn print_field_errors(&mut self) {
        let lines: Vec<String> = self
            .wizard
            .errors()
            .iter()
            .map(|(field, message)| format!("  {field}: {message}"))
            .collect();
        for line in lines {
            self.io.print_line(&line);
        }
    }

    fn print_estimate_panel(&mut self) {
        let line = match self.wizard.estimate_state() {
            EstimateState::Idle => return,
            EstimateState::Loading => "Smart estimate: checking clearing history...".to_string(),
            EstimateState::Ready(result) => {
                let Some(amount) = result.average_clearing_cost else {
                    return;
                };
                let mut line = format!(
                    "Smart estimate: {} across {} historical records",
                    format_naira(amount),
                    result.sample_size
                );
                if let Some(match_type) = result.match_type {
                    line.push_str(&format!(" ({})", match_type.label()));
                }
                if result.is_normalized {
                    line.push_str(" (normalized for current exchange rate)");
                }
                line
            }
            EstimateState::NoData => {
                "Smart estimate: no clearing history for this vehicle yet.".to_string()
            }
            EstimateState::Failed(message) => format!("Smart estimate unavailable: {message}"),
        };
        self.io.print_line(&line);
    }

    fn confirm_cancel(&mut self) -> Result<Flow, CliError> {
        if self.io.confirm("Discard this intake?")? {
            Ok(Flow::Cancelled)
        } else {
            Ok(Flow::Continue)
        }
    }

    fn step_clearance(&mut self) -> Result<Flow, CliError> {
        let options: Vec<String> = ClearanceType::ALL
            .iter()
            .map(|clearance| clearance.label().to_string())
            .collect();
        let default = self
            .wizard
            .draft()
            .clearance_type
            .and_then(|current| ClearanceType::ALL.iter().position(|c| *c == current));
        match self
            .io
            .prompt_choice("Clearance type", &options, default, false)?
        {
            ChoiceOutcome::Picked(idx) => {
                self.wizard.set_clearance_type(ClearanceType::ALL[idx]);
                self.advance();
                Ok(Flow::Continue)
            }
            ChoiceOutcome::Back => Ok(Flow::Continue),
            ChoiceOutcome::Cancel => self.confirm_cancel(),
        }
    }

    fn step_vehicle_info(&mut self) -> Result<Flow, CliError> {
        let vin_default = self.wizard.draft().vin.clone();
        match self.prompt_required("VIN (17 characters)", &vin_default)? {
            PromptOutcome::Value(vin) => {
                let now = self.clock.now();
                self.wizard.set_vin(&vin, now);
                self.drain_side_channels();
                if self.wizard.vin_availability() == VinAvailability::Taken {
                    self.io
                        .print_line("  VIN: This VIN is already registered");
                }
            }
            PromptOutcome::Back => return Ok(self.go_back()),
            PromptOutcome::Cancel => return self.confirm_cancel(),
        }

        let make_default = self.wizard.draft().make.clone();
        match self.prompt_required("Make", &make_default)? {
            PromptOutcome::Value(make) => {
                let now = self.clock.now();
                self.wizard.set_make(&make, now);
            }
            PromptOutcome::Back => return Ok(self.go_back()),
            PromptOutcome::Cancel => return self.confirm_cancel(),
        }

        let options: Vec<String> = self.wizard.model_options().to_vec();
        if options.is_empty() {
            let model_default = self.wizard.draft().model.clone();
            match self.prompt_required("Model", &model_default)? {
                PromptOutcome::Value(model) => {
                    let now = self.clock.now();
                    self.wizard.set_model(&model, now);
                }
                PromptOutcome::Back => return Ok(self.go_back()),
                PromptOutcome::Cancel => return self.confirm_cancel(),
            }
        } else {
            let default = options
                .iter()
                .position(|model| model.eq_ignore_ascii_case(&self.wizard.draft().model));
            match self.io.prompt_choice("Model", &options, default, true)? {
                ChoiceOutcome::Picked(idx) => {
                    let model = options[idx].clone();
                    let now = self.clock.now();
                    self.wizard.set_model(&model, now);
                }
                ChoiceOutcome::Back => return Ok(self.go_back()),
                ChoiceOutcome::Cancel => return self.confirm_cancel(),
            }
        }

        let year_default = self
            .wizard
            .draft()
            .year
            .map(|year| year.to_string())
            .unwrap_or_default();
        loop {
            match self.prompt_required("Year", &year_default)? {
                PromptOutcome::Value(raw) => match raw.trim().parse::<i32>() {
                    Ok(year) => {
                        let now = self.clock.now();
                        self.wizard.set_year(Some(year), now);
                        break;
                    }
                    Err(_) => self.io.print_line("  Year: enter a whole number"),
                },
                PromptOutcome::Back => return Ok(self.go_back()),
                PromptOutcome::Cancel => return self.confirm_cancel(),
            }
        }

        let color_default = self.wizard.draft().color.clone().unwrap_or_default();
        match self.io.prompt_text("Color (optional)", Some(&color_default))? {
            PromptOutcome::Value(color) => {
                let trimmed = color.trim();
                self.wizard.set_color(if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                });
            }
            PromptOutcome::Back => return Ok(self.go_back()),
            PromptOutcome::Cancel => return self.confirm_cancel(),
        }

        self.drain_side_channels();
        self.advance();
        Ok(Flow::Continue)
    }

    fn step_shipping(&mut self) -> Result<Flow, CliError> {
        let ship_default = self.wizard.draft().ship_name.clone().unwrap_or_default();
        match self
            .io
            .prompt_text("Ship name (optional)", Some(&ship_default))?
        {
            PromptOutcome::Value(name) => {
                let trimmed = name.trim();
                self.wizard.set_ship_name(if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                });
            }
            PromptOutcome::Back => return Ok(self.go_back()),
            PromptOutcome::Cancel => return self.confirm_cancel(),
        }

        let mut options = vec!["None".to_string()];
        options.extend(Terminal::ALL.iter().map(|t| t.label().to_string()));
        let default = self
            .wizard
            .draft()
            .terminal
            .and_then(|current| Terminal::ALL.iter().position(|t| *t == current))
            .map(|idx| idx + 1)
            .or(Some(0));
        match self.io.prompt_choice("Terminal", &options, default, true)? {
            ChoiceOutcome::Picked(0) => {
                let now = self.clock.now();
                self.wizard.set_terminal(None, now);
            }
            ChoiceOutcome::Picked(idx) => {
                let now = self.clock.now();
                self.wizard.set_terminal(Some(Terminal::ALL[idx - 1]), now);
            }
            ChoiceOutcome::Back => return Ok(self.go_back()),
            ChoiceOutcome::Cancel => return self.confirm_cancel(),
        }

        let arrival_default = self
            .wizard
            .draft()
            .arrival_date
            .map(|date| date.to_string())
            .unwrap_or_default();
        loop {
            match self
                .io
                .prompt_text("Arrival date (YYYY-MM-DD, optional)", Some(&arrival_default))?
            {
                PromptOutcome::Value(raw) => {
                    let trimmed = raw.trim();
                    if trimmed.is_empty() {
                        self.wizard.set_arrival_date(None);
                        break;
                    }
                    match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
                        Ok(date) => {
                            self.wizard.set_arrival_date(Some(date));
                            break;
                        }
                        Err(_) => self.io.print_line("  Arrival date: use YYYY-MM-DD format"),
                    }
                }
                PromptOutcome::Back => return Ok(self.go_back()),
                PromptOutcome::Cancel => return self.confirm_cancel(),
            }
        }

        self.drain_side_channels();
        self.advance();
        Ok(Flow::Continue)
    }

    fn step_costs(&mut self) -> Result<Flow, CliError> {
        self.drain_side_channels();
        self.print_estimate_panel();

        for field in self.wizard.visible_cost_fields() {
            let default = self
                .wizard
                .draft()
                .costs
                .get(&field)
                .map(|value| format!("{value}"))
                .unwrap_or_default();
            loop {
                let label = format!("{} (₦, optional)", field.label());
                match self.io.prompt_text(&label, Some(&default))? {
                    PromptOutcome::Value(raw) => {
                        let trimmed = raw.trim();
                        if trimmed.is_empty() {
                            self.wizard.set_cost(field, None);
                            break;
                        }
                        match trimmed.parse::<f64>() {
                            Ok(amount) if amount >= 0.0 => {
                                self.wizard.set_cost(field, Some(amount));
                                break;
                            }
                            Ok(_) => self
                                .io
                                .print_line("  Amount must be zero or positive"),
                            Err(_) => self.io.print_line("  Enter a numeric amount"),
                        }
                    }
                    PromptOutcome::Back => return Ok(self.go_back()),
                    PromptOutcome::Cancel => return self.confirm_cancel(),
                }
            }
        }

        self.advance();
        Ok(Flow::Continue)
    }

    fn step_review(&mut self) -> Result<ReviewFlow, CliError> {
        self.drain_side_channels();
        let entries = self.wizard.review_entries();
        for (label, value) in entries {
            self.io.print_line(&format!("  {label}: {value}"));
        }
        self.print_estimate_panel();

        let options = vec![
            "Create vehicle".to_string(),
            "Go back".to_string(),
            "Cancel intake".to_string(),
        ];
        match self.io.prompt_choice("Review", &options, Some(0), false)? {
            ChoiceOutcome::Picked(0) => match self.wizard.submit(self.vehicle_api, self.clock) {
                Ok(record) => Ok(ReviewFlow::Submitted(Box::new(record))),
                Err(SubmitError::Rejected(message)) => {
                    self.io.print_line(&format!("Submission failed: {message}"));
                    Ok(ReviewFlow::Continue)
                }
                Err(SubmitError::AlreadyInFlight) => {
                    self.io
                        .print_line("A submission is already in flight; please wait.");
                    Ok(ReviewFlow::Continue)
                }
                Err(SubmitError::Incomplete(message)) => {
                    self.io.print_line(&format!("Cannot submit: {message}"));
                    self.print_field_errors();
                    Ok(ReviewFlow::Continue)
                }
            },
            ChoiceOutcome::Picked(1) | ChoiceOutcome::Back => {
                self.wizard.back();
                Ok(ReviewFlow::Continue)
            }
            ChoiceOutcome::Picked(_) | ChoiceOutcome::Cancel => {
                if self.io.confirm("Discard this intake?")? {
                    Ok(ReviewFlow::Cancelled)
                } else {
                    Ok(ReviewFlow::Continue)
                }
            }
        }
    }

    fn go_back(&mut self) -> Flow {
        self.wizard.back();
        Flow::Continue
    }

    /// Required text field: re-prompts while the entry is blank.
    fn prompt_required(&mut self, label: &str, default: &str) -> Result<PromptOutcome, CliError> {
        loop {
            match self.io.prompt_text(label, Some(default))? {
                PromptOutcome::Value(value) if value.trim().is_empty() => {
                    self.io.print_line("  This field is required");
                }
                other => return Ok(other),
            }
        }
    }
}

/// Terminal-backed interaction using the shared dialoguer theme.
pub struct DialoguerIo {
    theme: ColorfulTheme,
}

impl DialoguerIo {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for DialoguerIo {
    fn default() -> Self {
        Self::new()
    }
}

impl IntakeIo for DialoguerIo {
    fn prompt_text(&mut self, label: &str, default: Option<&str>) -> Result<PromptOutcome, CliError> {
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(label)
            .allow_empty(true);
        if let Some(default) = default {
            if !default.is_empty() {
                input = input.default(default.to_string()).show_default(true);
            }
        }
        let value = input
            .interact_text()
            .map_err(|err| CliError::Command(err.to_string()))?;
        Ok(match value.trim() {
            ":back" => PromptOutcome::Back,
            ":cancel" => PromptOutcome::Cancel,
            other => PromptOutcome::Value(other.to_string()),
        })
    }

    fn prompt_choice(
        &mut self,
        label: &str,
        options: &[String],
        default: Option<usize>,
        allow_back: bool,
    ) -> Result<ChoiceOutcome, CliError> {
        let mut items = options.to_vec();
        if allow_back {
            items.push("← Back".to_string());
        }
        let selection = Select::with_theme(&self.theme)
            .with_prompt(label)
            .items(&items)
            .default(default.unwrap_or(0))
            .interact_opt()
            .map_err(|err| CliError::Command(err.to_string()))?;
        Ok(match selection {
            Some(idx) if allow_back && idx == options.len() => ChoiceOutcome::Back,
            Some(idx) => ChoiceOutcome::Picked(idx),
            // ESC abandons the prompt; the runner confirms before discarding.
            None => ChoiceOutcome::Cancel,
        })
    }

    fn confirm(&mut self, question: &str) -> Result<bool, CliError> {
        Confirm::with_theme(&self.theme)
            .with_prompt(question)
            .default(false)
            .interact()
            .map_err(|err| CliError::Command(err.to_string()))
    }

    fn print_line(&mut self, line: &str) {
        println!("{line}");
    }
}

/// Scripted interaction for tests and the `--script` mode: answers come from
/// a fixed queue, output accumulates in a transcript.
pub struct ScriptedIo {
    responses: VecDeque<String>,
    transcript: Vec<String>,
    echo: bool,
}

impl ScriptedIo {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: responses.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
            echo: false,
        }
    }

    /// Loads responses from a file, one per line. Blank lines and `#`
    /// comments are skipped; output is echoed to stdout.
    pub fn from_file(path: &Path) -> Result<Self, CliError> {
        let data = fs::read_to_string(path)
            .map_err(|err| CliError::Input(format!("cannot read script {}: {err}", path.display())))?;
        let responses: Vec<String> = data
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();
        let mut io = Self::new(responses);
        io.echo = true;
        Ok(io)
    }

    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    fn next_response(&mut self) -> Option<String> {
        self.responses.pop_front()
    }

    fn record(&mut self, line: String) {
        if self.echo {
            println!("{line}");
        }
        self.transcript.push(line);
    }
}

impl IntakeIo for ScriptedIo {
    fn prompt_text(&mut self, label: &str, _default: Option<&str>) -> Result<PromptOutcome, CliError> {
        self.record(format!("? {label}"));
        Ok(match self.next_response().as_deref() {
            None | Some(":cancel") => PromptOutcome::Cancel,
            Some(":back") => PromptOutcome::Back,
            Some(value) => PromptOutcome::Value(value.to_string()),
        })
    }

    fn prompt_choice(
        &mut self,
        label: &str,
        options: &[String],
        _default: Option<usize>,
        allow_back: bool,
    ) -> Result<ChoiceOutcome, CliError> {
        self.record(format!("? {label}"));
        let Some(response) = self.next_response() else {
            return Ok(ChoiceOutcome::Cancel);
        };
        match response.as_str() {
            ":cancel" => return Ok(ChoiceOutcome::Cancel),
            ":back" if allow_back => return Ok(ChoiceOutcome::Back),
            ":back" => return Ok(ChoiceOutcome::Cancel),
            _ => {}
        }
        if let Ok(number) = response.trim().parse::<usize>() {
            if number >= 1 && number <= options.len() {
                return Ok(ChoiceOutcome::Picked(number - 1));
            }
        }
        if let Some(idx) = options
            .iter()
            .position(|option| option.eq_ignore_ascii_case(response.trim()))
        {
            return Ok(ChoiceOutcome::Picked(idx));
        }
        Err(CliError::Input(format!(
            "scripted response `{response}` does not match an option of `{label}`"
        )))
    }

    fn confirm(&mut self, question: &str) -> Result<bool, CliError> {
        self.record(format!("? {question}"));
        Ok(matches!(
            self.next_response().as_deref(),
            Some("y") | Some("yes") | Some("true")
        ))
    }

    fn print_line(&mut self, line: &str) {
        self.record(line.to_string());
    }
}
