//! Terminal output for spamwatchctl.

use owo_colors::OwoColorize;
use spamwatch_common::schemas::{
    ActionResponse, ApiInfo, BatchItem, BatchPredictionResponse, FilePredictionResponse,
    HealthResponse, PredictionResponse, StatisticsResponse,
};
use spamwatch_common::Label;

const HR: &str = "────────────────────────────────────────";

/// Key width for aligned key/value lines
const KW: usize = 18;

fn print_kv(key: &str, value: &str) {
    println!("{:width$} {}", key, value, width = KW);
}

fn label_badge(label: Label) -> String {
    match label {
        Label::Spam => "SPAM".red().bold().to_string(),
        Label::Ham => "HAM".green().bold().to_string(),
    }
}

pub fn print_prediction(resp: &PredictionResponse) {
    println!("{}  {:.2}% confident", label_badge(resp.prediction), resp.confidence);
    println!("{}", HR.dimmed());
    print_kv("message", &resp.message_preview);
    print_kv("processing_time", &format!("{:.4}s", resp.processing_time));
    print_kv("timestamp", &resp.timestamp);
}

fn print_items(items: &[BatchItem]) {
    for (i, item) in items.iter().enumerate() {
        println!(
            "{:>3}. {:<6} {:>6.2}%  {}",
            i + 1,
            label_badge(item.prediction),
            item.confidence,
            item.message
        );
    }
}

fn spam_total(items: &[BatchItem]) -> usize {
    items.iter().filter(|i| i.prediction == Label::Spam).count()
}

pub fn print_batch(resp: &BatchPredictionResponse) {
    print_items(&resp.results);
    println!("{}", HR.dimmed());
    println!(
        "{} processed, {} spam, in {:.4}s",
        resp.total_processed,
        spam_total(&resp.results),
        resp.processing_time
    );
}

pub fn print_file(resp: &FilePredictionResponse) {
    println!("{}", resp.filename.bold());
    print_items(&resp.results);
    println!("{}", HR.dimmed());
    println!(
        "{} processed, {} spam",
        resp.total_processed,
        spam_total(&resp.results)
    );
}

pub fn print_statistics(stats: &StatisticsResponse) {
    println!("{}", "Model".bold());
    print_kv("accuracy", &format!("{:.2}%", stats.accuracy * 100.0));
    print_kv("precision", &format!("{:.2}%", stats.precision * 100.0));
    print_kv("recall", &format!("{:.2}%", stats.recall * 100.0));
    print_kv("f1_score", &format!("{:.2}%", stats.f1_score * 100.0));
    println!();
    println!("{}", "History".bold());
    print_kv("total_predictions", &stats.total_predictions.to_string());
    print_kv("spam", &stats.spam_count.to_string());
    print_kv("ham", &stats.ham_count.to_string());

    if !stats.recent_predictions.is_empty() {
        println!();
        println!("{}", "Recent".bold());
        for entry in stats.recent_predictions.iter().rev() {
            println!(
                "{}  {:<6} {:>6.2}%  {}",
                entry.timestamp.dimmed(),
                label_badge(entry.prediction),
                entry.confidence,
                entry.message
            );
        }
    }
}

pub fn print_health(health: &HealthResponse) {
    let status = if health.model_loaded {
        health.status.green().to_string()
    } else {
        health.status.yellow().to_string()
    };
    print_kv("status", &status);
    print_kv("model_loaded", if health.model_loaded { "yes" } else { "no" });
    print_kv("uptime", &format!("{}s", health.uptime_seconds));
    print_kv("timestamp", &health.timestamp);
}

pub fn print_info(base_url: &str, info: &ApiInfo) {
    println!("{} v{}", info.message.bold(), info.version);
    print_kv("daemon", base_url);
    println!("{}", HR.dimmed());
    for (endpoint, description) in &info.endpoints {
        print_kv(endpoint, description);
    }
}

pub fn print_action(resp: &ActionResponse) {
    println!("{} {}", "✓".green(), resp.message);
}
