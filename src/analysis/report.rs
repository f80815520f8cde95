use serde::Serialize;

use super::counter::FrequencyMap;

/// Categories written to the frequency table, one per report section.
pub const CATEGORIES: [&str; 3] = ["top_words", "technologies", "soft_skills"];

/// Frequencies computed over one batch of job descriptions.
#[derive(Debug, Clone, Serialize)]
pub struct DescriptionReport {
    pub descriptions: usize,
    pub tokens: usize,
    pub top_words: Vec<(String, usize)>,
    pub technologies: FrequencyMap,
    pub soft_skills: FrequencyMap,
}

impl DescriptionReport {
    /// (category, term, count) rows for the frequency table.
    pub fn frequency_rows(&self) -> Vec<(&'static str, &str, usize)> {
        let mut rows = Vec::new();
        for (term, count) in &self.top_words {
            rows.push((CATEGORIES[0], term.as_str(), *count));
        }
        for (term, count) in &self.technologies {
            rows.push((CATEGORIES[1], term.as_str(), *count));
        }
        for (term, count) in &self.soft_skills {
            rows.push((CATEGORIES[2], term.as_str(), *count));
        }
        rows
    }

    pub fn render_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("## Description Analysis\n");
        out.push_str(&format!(
            "- Descriptions: {}\n- Tokens after cleaning: {}\n",
            self.descriptions, self.tokens
        ));

        out.push_str("\n### Most common words\n");
        for (word, count) in &self.top_words {
            out.push_str(&format!("- {}: {}\n", word, count));
        }

        out.push_str("\n### Technologies\n");
        push_ranked(&mut out, &self.technologies);

        out.push_str("\n### Non-technical skills\n");
        push_ranked(&mut out, &self.soft_skills);

        out
    }
}

fn push_ranked(out: &mut String, counts: &FrequencyMap) {
    if counts.is_empty() {
        out.push_str("- (none)\n");
        return;
    }
    let mut ranked: Vec<(&String, &usize)> = counts.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (term, count) in ranked {
        out.push_str(&format!("- {}: {}\n", term, count));
    }
}
