use crate::error::{ToolsError, UserFriendlyError};
use crate::extractor::ExtractionReport;
use crate::sync::{SyncEvent, SyncPlan, SyncReport};
use crate::ui::progress::format_duration;
use console::{style, Emoji, Term};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

// Emojis with text fallbacks
static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");
static ROCKET: Emoji = Emoji("🚀 ", "> ");
static SPARKLES: Emoji = Emoji("✨ ", "* ");

#[derive(Clone)]
pub struct OutputFormatter {
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let use_colors = match mode {
            OutputMode::Human => Term::stdout().features().colors_supported() && !quiet,
            _ => false,
        };

        Self {
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    // Core messaging methods
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Success, message),
            OutputMode::Json => self.print_json_message("success", message),
            OutputMode::Plain => println!("SUCCESS: {}", message),
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Error, message),
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => eprintln!("ERROR: {}", message),
        }
    }

    pub fn warning(&self, message: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Warning, message),
                OutputMode::Json => self.print_json_message("warning", message),
                OutputMode::Plain => println!("WARNING: {}", message),
            }
        }
    }

    pub fn info(&self, message: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Info, message),
                OutputMode::Json => self.print_json_message("info", message),
                OutputMode::Plain => println!("INFO: {}", message),
            }
        }
    }

    pub fn debug(&self, message: &str) {
        if self.should_show_message(2) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("  {}", style(message).dim());
                    } else {
                        println!("  DEBUG: {}", message);
                    }
                }
                OutputMode::Json => self.print_json_message("debug", message),
                OutputMode::Plain => println!("DEBUG: {}", message),
            }
        }
    }

    pub fn start_operation(&self, operation: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("{}{}", ROCKET, style(operation).bold());
                    } else {
                        println!("> {}", operation);
                    }
                }
                OutputMode::Json => self.print_json_message("operation_start", operation),
                OutputMode::Plain => println!("STARTING: {}", operation),
            }
        }
    }

    /// Prints the running commentary of a library sync.
    ///
    /// Human and plain modes keep the line shapes `Downloading: <url>`,
    /// `headers: <dest>`, `<arch> (<dest>):` and a tab before each copied file.
    pub fn sync_event(&self, event: &SyncEvent<'_>) {
        if !self.should_show_message(0) {
            return;
        }

        let line = match event {
            SyncEvent::Downloading { url } => format!("Downloading: {}", url),
            SyncEvent::Extracted { files, scratch } => {
                self.debug(&format!("Extracted {} files into {}", files, scratch.display()));
                return;
            }
            SyncEvent::Headers { destination, .. } => {
                format!("headers: {}", destination.display())
            }
            SyncEvent::ArchStarted { name, destination } => {
                format!("{} ({}):", name, destination.display())
            }
            SyncEvent::FileCopied { filename, .. } => format!("\t{}", filename),
        };

        match self.mode {
            OutputMode::Json => self.print_json_object(&serde_json::json!({
                "type": "progress",
                "message": line.trim_start(),
                "timestamp": chrono::Utc::now().to_rfc3339()
            })),
            OutputMode::Human if self.use_colors => match event {
                SyncEvent::FileCopied { .. } => println!("{}", style(line).dim()),
                _ => println!("{}", style(line).cyan()),
            },
            _ => println!("{}", line),
        }
    }

    // User-friendly error handling
    pub fn print_user_friendly_error(&self, error: &ToolsError) {
        let user_message = error.user_message();
        self.error(&user_message);

        if let Some(suggestion) = error.suggestion() {
            match self.mode {
                OutputMode::Human => {
                    eprintln!();
                    if self.use_colors {
                        eprintln!(
                            "{}{}",
                            INFO,
                            style(&format!("Suggestion: {}", suggestion)).cyan()
                        );
                    } else {
                        eprintln!("Suggestion: {}", suggestion);
                    }
                }
                OutputMode::Json => {
                    self.print_json_object(&serde_json::json!({
                        "type": "suggestion",
                        "message": suggestion
                    }));
                }
                OutputMode::Plain => {
                    eprintln!("SUGGESTION: {}", suggestion);
                }
            }
        }
    }

    // Summary and reporting
    pub fn print_extraction_report(&self, report: &ExtractionReport) {
        match self.mode {
            OutputMode::Human => {
                if !self.quiet {
                    self.print_human_extraction_report(report);
                }
            }
            OutputMode::Json => self.print_json_pretty(report),
            OutputMode::Plain => {
                if !self.quiet {
                    self.print_plain_extraction_report(report);
                }
            }
        }
    }

    pub fn print_sync_report(&self, report: &SyncReport) {
        match self.mode {
            OutputMode::Human => {
                if !self.quiet {
                    self.print_human_sync_report(report);
                }
            }
            OutputMode::Json => self.print_json_pretty(report),
            OutputMode::Plain => {
                if !self.quiet {
                    self.print_plain_sync_report(report);
                }
            }
        }
    }

    pub fn print_sync_plan(&self, plan: &SyncPlan) {
        if self.mode == OutputMode::Json {
            self.print_json_pretty(plan);
            return;
        }

        self.print_header("Sync Plan");
        println!(
            "  Archive:       {} ({})",
            plan.archive,
            if plan.remote { "download" } else { "local file" }
        );
        if plan.remote && plan.insecure {
            println!("  TLS:           certificate verification disabled");
        }
        println!("  Scratch dir:   {}", plan.scratch_dir.display());
        println!(
            "  Headers:       {} -> {}",
            plan.include_source.display(),
            plan.include_destination.display()
        );
        for arch in &plan.arches {
            println!(
                "  {}: {} -> {}",
                arch.name,
                arch.source.display(),
                arch.destination.display()
            );
            println!("      filter: {}", arch.filter);
        }
        self.print_separator();
    }

    // Specialized output methods
    pub fn print_header(&self, title: &str) {
        match self.mode {
            OutputMode::Human => {
                println!();
                if self.use_colors {
                    println!("{} {}", SPARKLES, style(title).bold().cyan());
                } else {
                    println!("=== {} ===", title);
                }
                println!();
            }
            OutputMode::Json => {
                self.print_json_object(&serde_json::json!({
                    "type": "header",
                    "title": title
                }));
            }
            OutputMode::Plain => {
                println!("=== {} ===", title);
            }
        }
    }

    pub fn print_separator(&self) {
        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    println!("{}", style("─".repeat(60)).dim());
                } else {
                    println!("{}", "-".repeat(60));
                }
            }
            OutputMode::Plain => {
                println!("{}", "-".repeat(60));
            }
            OutputMode::Json => {} // No separator in JSON mode
        }
    }

    // Private helper methods
    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }

    fn print_human_message(&self, msg_type: MessageType, message: &str) {
        #[allow(clippy::type_complexity)]
        let (emoji, color_fn): (Emoji, Box<dyn Fn(&str) -> console::StyledObject<&str>>) =
            match msg_type {
                MessageType::Success => (CHECKMARK, Box::new(|msg| style(msg).green().bold())),
                MessageType::Error => (CROSS, Box::new(|msg| style(msg).red().bold())),
                MessageType::Warning => (WARNING, Box::new(|msg| style(msg).yellow().bold())),
                MessageType::Info => (INFO, Box::new(|msg| style(msg).cyan())),
            };

        if self.use_colors {
            match msg_type {
                MessageType::Error => eprintln!("{}{}", emoji, color_fn(message)),
                _ => println!("{}{}", emoji, color_fn(message)),
            }
        } else {
            let prefix = match msg_type {
                MessageType::Success => "✓",
                MessageType::Error => "✗",
                MessageType::Warning => "!",
                MessageType::Info => "i",
            };

            match msg_type {
                MessageType::Error => eprintln!("{} {}", prefix, message),
                _ => println!("{} {}", prefix, message),
            }
        }
    }

    fn print_json_message(&self, level: &str, message: &str) {
        self.print_json_object(&serde_json::json!({
            "type": "message",
            "level": level,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));
    }

    fn print_json_object(&self, obj: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn print_json_pretty<T: serde::Serialize>(&self, value: &T) {
        println!(
            "{}",
            serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn highlight(&self, value: impl ToString) -> String {
        if self.use_colors {
            style(value.to_string()).cyan().bold().to_string()
        } else {
            value.to_string()
        }
    }

    fn print_human_extraction_report(&self, report: &ExtractionReport) {
        println!();
        self.print_separator();

        if self.use_colors {
            println!(
                "{} {}",
                style("Reference fragments written!").green().bold(),
                CHECKMARK
            );
        } else {
            println!("✓ Reference fragments written!");
        }

        println!();
        println!("  Sources scanned: {}", self.highlight(report.files_scanned));
        println!("  Doc-blocks:      {}", self.highlight(report.total_blocks));
        println!("  Fragments:       {}", self.highlight(report.fragments.len()));
        println!(
            "  Output:          {}",
            self.highlight(report.output_dir.display())
        );
        println!(
            "  Time taken:      {}",
            self.highlight(format_duration(report.duration))
        );

        if self.verbose_level > 0 && !report.fragments.is_empty() {
            println!();
            for fragment in &report.fragments {
                println!(
                    "  {} -> {} ({} blocks)",
                    fragment.source,
                    fragment.fragment.display(),
                    fragment.blocks
                );
            }
        }

        self.print_separator();
    }

    fn print_plain_extraction_report(&self, report: &ExtractionReport) {
        println!("COMPLETED: Reference extraction");
        println!("Sources: {}", report.files_scanned);
        println!("Blocks: {}", report.total_blocks);
        println!("Fragments: {}", report.fragments.len());
        for fragment in &report.fragments {
            println!("FRAGMENT: {} {}", fragment.blocks, fragment.fragment.display());
        }
        println!("Duration: {:?}", report.duration);
    }

    fn print_human_sync_report(&self, report: &SyncReport) {
        println!();
        self.print_separator();

        if self.use_colors {
            println!("{} {}", style("Library updated!").green().bold(), CHECKMARK);
        } else {
            println!("✓ Library updated!");
        }

        println!();
        println!("  Archive:         {}", self.highlight(&report.archive));
        println!(
            "  Headers:         {} files in {}",
            self.highlight(report.headers_copied),
            report.include_destination.display()
        );
        for arch in &report.arches {
            println!(
                "  {:<16} {} copied, {} skipped",
                format!("{}:", arch.name),
                self.highlight(arch.copied.len()),
                arch.skipped.len()
            );
        }
        println!(
            "  Time taken:      {}",
            self.highlight(format_duration(report.duration))
        );

        self.print_separator();
    }

    fn print_plain_sync_report(&self, report: &SyncReport) {
        println!("COMPLETED: Library sync");
        println!("Archive: {}", report.archive);
        println!("Headers: {}", report.headers_copied);
        for arch in &report.arches {
            println!(
                "Arch {}: {} copied, {} skipped",
                arch.name,
                arch.copied.len(),
                arch.skipped.len()
            );
        }
        println!("Duration: {:?}", report.duration);
    }
}

#[derive(Debug, Clone, Copy)]
enum MessageType {
    Success,
    Error,
    Warning,
    Info,
}
