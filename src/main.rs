use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use dealflow::domain::{DecisionOutcome, EvaluationRecord, PersonaAnswers, PersonaAssessment, load_candidates};
use dealflow::id::run_id;
use dealflow::llm::{AnthropicClient, AnthropicConfig, DisabledLlmClient, LlmClient};
use dealflow::policy::EvaluationPolicy;
use dealflow::search::{self, DisabledSearch, SearchClient, WebSearch};
use dealflow::stages::{
    AnswerSource, CompetitorStage, DecisionStage, FixedAnswers, LlmCandidateScorer, MarketStage, PersonaStage,
    RankingStage, ReportStage, StdinAnswers, TechnicalStage,
};
use dealflow::tech::{GuardedSubWorkflow, LlmTechAdvisor};
use dealflow::workflow::{StageSequencer, StageSet};

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::Config;

fn setup_logging(default_level: &str) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dealflow")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("dealflow.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn build_llm(config: &Config) -> Arc<dyn LlmClient> {
    let llm_config = AnthropicConfig {
        model: config.llm.model.clone(),
        timeout: Duration::from_millis(config.llm.timeout_ms),
        max_retries: config.llm.max_retries,
    };
    match AnthropicClient::new(llm_config) {
        Ok(client) => {
            info!("LLM analysis via {}", client.model());
            Arc::new(client)
        }
        Err(e) => {
            warn!("LLM unavailable, analysis stages will use fallbacks: {}", e);
            println!("{} LLM unavailable, running with fallbacks", "Warning:".yellow());
            Arc::new(DisabledLlmClient)
        }
    }
}

fn build_search(config: &Config) -> Arc<dyn SearchClient> {
    let Some(search_config) = search::SearchConfig::from_env() else {
        warn!("no search API key set, using placeholder results");
        return Arc::new(DisabledSearch);
    };
    let provider = search_config.provider;
    match WebSearch::new(search_config, Duration::from_millis(config.search.timeout_ms)) {
        Ok(client) => {
            info!("web search via {}", provider.as_str());
            Arc::new(client)
        }
        Err(e) => {
            warn!("failed to build search client: {}", e);
            Arc::new(DisabledSearch)
        }
    }
}

fn build_policy() -> Result<Arc<EvaluationPolicy>> {
    let policy = EvaluationPolicy::default();
    policy.validate().context("Invalid evaluation policy")?;
    Ok(Arc::new(policy))
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Run {
            candidates,
            answers,
            output_dir,
        } => handle_run_command(candidates, *answers, output_dir.as_ref(), config).await,
        Commands::Persona { answers } => handle_persona_command(answers),
        Commands::Checklist => handle_checklist_command(),
    }
}

async fn handle_run_command(
    candidates_path: &Path,
    answers: Option<PersonaAnswers>,
    output_dir: Option<&PathBuf>,
    config: &Config,
) -> Result<()> {
    let candidates = load_candidates(candidates_path)
        .context(format!("Failed to load candidates from {}", candidates_path.display()))?;
    info!("Loaded {} candidate(s) from {}", candidates.len(), candidates_path.display());
    println!("{} {} candidate(s)", "Evaluating:".green(), candidates.len());

    let policy = build_policy()?;
    let llm = build_llm(config);
    let search = build_search(config);
    let max_results = config.search.max_results;
    let max_tokens = config.llm.max_tokens;
    let run = run_id(&candidates_path.display().to_string());

    let source: Box<dyn AnswerSource> = match answers {
        Some(answers) => Box::new(FixedAnswers(answers)),
        None => Box::new(StdinAnswers),
    };
    let scorer = Arc::new(LlmCandidateScorer::new(llm.clone(), search.clone(), max_results, max_tokens));
    let advisor = Arc::new(LlmTechAdvisor::new(llm.clone(), max_tokens));
    let sub_workflow = GuardedSubWorkflow::new(search.clone(), advisor, config.workflow.tech_limits(max_results));
    let report_settings = config.report.settings(output_dir);
    let report_path = report_settings.output_dir.join(&report_settings.file_name);

    let stages = StageSet {
        persona: Arc::new(PersonaStage::new(source)),
        ranking: Arc::new(RankingStage::new(policy.clone(), candidates, scorer)),
        technical: Arc::new(TechnicalStage::new(sub_workflow)),
        market: Arc::new(MarketStage::new(llm.clone(), search.clone(), max_results, max_tokens)),
        competitor: Arc::new(CompetitorStage::new(llm.clone(), search.clone(), max_results, max_tokens)),
        decision: Arc::new(DecisionStage::new(llm.clone(), policy.clone(), max_tokens)),
        report: Arc::new(ReportStage::new(policy.clone(), report_settings, run.clone())),
    };
    let sequencer = StageSequencer::new(stages, config.workflow.limits()).context("Failed to assemble workflow")?;

    info!("Starting run {}", run);
    let outcome = sequencer.run(EvaluationRecord::new()).await.context("Evaluation run failed")?;

    let record = &outcome.record;
    if let Some(persona) = record.persona() {
        println!("{} {}", "Persona:".cyan(), persona);
    }
    for (candidate, decision) in record.evaluated_candidates() {
        let label = match decision {
            DecisionOutcome::Accept => decision.as_str().green(),
            DecisionOutcome::Hold => decision.as_str().yellow(),
            DecisionOutcome::Reject => decision.as_str().red(),
        };
        println!("  {} {:<30} {}", decision.marker(), candidate.name, label);
    }
    match record.termination() {
        Some(termination) if termination.is_success() => println!("{} {}", "Result:".green(), termination.reason()),
        Some(termination) => println!("{} {}", "Result:".yellow(), termination.reason()),
        None => println!("{} run ended without a termination record", "Result:".red()),
    }
    println!(
        "{} {} ({} step(s))",
        "Report:".cyan(),
        report_path.display(),
        outcome.steps
    );
    Ok(())
}

fn handle_persona_command(answers: &PersonaAnswers) -> Result<()> {
    info!("Assessing persona for {:?}", answers);
    let policy = build_policy()?;
    let assessment = PersonaAssessment::from_answers(answers);

    println!("{} {}", "Persona:".green(), assessment.persona.as_str().to_uppercase());
    println!("  aggressive score:   {:.2}", assessment.aggressive_score);
    println!("  conservative score: {:.2}", assessment.conservative_score);
    println!("{}", "Ranking weights:".cyan());
    for (criterion, weight) in policy.weights(assessment.persona).entries() {
        println!("  {:<24} {:>3.0}%", criterion, weight * 100.0);
    }
    Ok(())
}

fn handle_checklist_command() -> Result<()> {
    let policy = build_policy()?;
    println!("{}", "Decision checklist:".cyan());
    for item in &policy.checklist {
        println!("  {}", item);
    }
    println!(
        "{} accept >= {}, hold >= {}, otherwise reject",
        "Thresholds:".cyan(),
        policy.accept_threshold,
        policy.hold_threshold
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    let level = if cli.is_verbose() {
        "debug".to_string()
    } else {
        config.log_level.clone().unwrap_or_else(|| "info".to_string())
    };
    setup_logging(&level).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
