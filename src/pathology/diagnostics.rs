//! Disease diagnostics report.

/// Structured report of the disease state
#[derive(Debug, Clone)]
pub struct PathologyDiagnostics {
    /// Disease label
    pub disease_name: String,
    /// Current severity (0.0 = healthy, 1.0 = severe)
    pub severity: f64,
    /// Named metrics
    pub metrics: Vec<(String, f64)>,
    /// Status lines
    pub status: Vec<String>,
    /// Warning lines
    pub warnings: Vec<String>,
}

impl PathologyDiagnostics {
    pub fn new(disease_name: &str) -> Self {
        Self {
            disease_name: disease_name.to_string(),
            severity: 0.0,
            metrics: Vec::new(),
            status: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_metric(&mut self, name: &str, value: f64) {
        self.metrics.push((name.to_string(), value));
    }

    pub fn add_status(&mut self, msg: &str) {
        self.status.push(msg.to_string());
    }

    pub fn add_warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    /// Look up a metric by name
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.iter().find(|(n, _)| n == name).map(|&(_, v)| v)
    }

    /// Print a formatted summary
    pub fn print_summary(&self) {
        println!("=== Disease: {} ===", self.disease_name);
        println!("Severity: {:.1}%", self.severity * 100.0);
        println!();

        if !self.metrics.is_empty() {
            println!("Metrics:");
            for (name, value) in &self.metrics {
                println!("  {}: {:.2}", name, value);
            }
            println!();
        }

        if !self.status.is_empty() {
            println!("Status:");
            for msg in &self.status {
                println!("  {}", msg);
            }
            println!();
        }

        if !self.warnings.is_empty() {
            println!("Warnings:");
            for msg in &self.warnings {
                println!("  {}", msg);
            }
        }
    }
}
