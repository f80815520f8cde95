pub mod counter;
pub mod normalize;
pub mod report;
pub mod stopwords;

use crate::settings::Settings;
use counter::{count_vocabulary, top_words};
use report::DescriptionReport;

/// Description blocks → tokens → top words and per-vocabulary frequencies.
pub fn analyze_descriptions<S: AsRef<str>>(descriptions: &[S], settings: &Settings) -> DescriptionReport {
    let tokens = normalize::normalize(descriptions);
    DescriptionReport {
        descriptions: descriptions.len(),
        tokens: tokens.len(),
        top_words: top_words(&tokens, settings.top_words),
        technologies: count_vocabulary(settings.match_mode, &tokens, &settings.technologies),
        soft_skills: count_vocabulary(settings.match_mode, &tokens, &settings.soft_skills),
    }
}
