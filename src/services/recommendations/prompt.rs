use chrono::{DateTime, Utc};

use crate::models::{CandidateMovie, FavoriteMovie};

pub const SYSTEM_PROMPT: &str = "You are a movie recommendation expert. Provide personalized \
movie recommendations based on user preferences and upcoming releases. Return only valid JSON, \
no markdown or additional text. Make sure to properly escape any special characters in strings.";

/// Per-call values mixed into the prompt so repeated requests vary
#[derive(Debug, Clone)]
pub struct PromptVariation {
    pub session_tag: String,
    pub generated_at: DateTime<Utc>,
}

impl PromptVariation {
    pub fn new() -> Self {
        let id = uuid::Uuid::new_v4().simple().to_string();
        Self {
            session_tag: id[..8].to_string(),
            generated_at: Utc::now(),
        }
    }
}

impl Default for PromptVariation {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the user-role instruction listing favorites and every candidate
pub fn build_user_prompt(
    favorites: &[FavoriteMovie],
    candidates: &[CandidateMovie],
    count: usize,
    variation: &PromptVariation,
) -> String {
    let favorites_block = if favorites.is_empty() {
        "- (none yet; pick broadly appealing releases)\n".to_string()
    } else {
        favorites
            .iter()
            .map(|movie| {
                format!(
                    "- {} ({})\n  Genres: {}\n  Overview: {}\n",
                    movie.title,
                    movie.release_date,
                    movie.genres.join(", "),
                    movie.overview
                )
            })
            .collect()
    };

    let candidates_block: String = candidates
        .iter()
        .map(|movie| {
            format!(
                "- ID: {}\n  Title: {}\n  Release Date: {}\n  Genres: {}\n  Overview: {}\n",
                movie.id,
                movie.title,
                movie.release_date,
                movie.genre_labels().join(", "),
                movie.overview
            )
        })
        .collect();

    format!(
        "As a movie recommendation expert, analyze these favorite movies and upcoming releases \
to provide personalized recommendations.
Session: {session} (generated {generated})

Favorite Movies:
{favorites_block}
Upcoming Movies to Consider (IMPORTANT: Only recommend movies from this list):
{candidates_block}
Please provide exactly {count} movie recommendations from the upcoming movies list above. \
For each recommendation:
1. Use ONLY the movie IDs from the list above
2. Explain why you're recommending it based on the user's favorite movies
3. Highlight any similarities in genre, style, or themes
4. Keep the explanation concise (2-3 sentences)

Vary your picks: do not simply take the first movies in the list.

IMPORTANT:
- Return ONLY a valid JSON object with this exact structure
- Use ONLY movie IDs from the list above
- Return exactly {count} recommendations with no duplicate movie IDs
- Do not include any markdown, code blocks, or additional text
- Escape any special characters in strings

Example format:
{{
  \"recommendations\": [
    {{
      \"movieId\": 123,
      \"title\": \"Movie Title\",
      \"explanation\": \"This movie is recommended because...\"
    }}
  ]
}}",
        session = variation.session_tag,
        generated = variation.generated_at.format("%Y-%m-%dT%H:%M:%SZ"),
    )
}
