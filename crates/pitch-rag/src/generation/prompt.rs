//! Prompt assembly for the completion service

use crate::storage::ScoredChunk;

/// Delimiter line between chunk blocks
const CHUNK_DELIMITER: &str = "--------------------------------\n";

/// Builds the instruction prompt from a question and its retrieved chunks.
///
/// Pure and deterministic: identical inputs produce byte-identical output.
pub struct PromptBuilder;

impl PromptBuilder {
    /// Assemble the full prompt: role preamble, the literal question,
    /// response-format directions, then one block per retrieved chunk.
    pub fn build(question: &str, results: &[ScoredChunk]) -> String {
        let mut prompt = format!(
            r#"### Identity ###
You are an AI sales trainer. Your main goal is to use the content of experienced sales trainers
in order to answer questions and give specific examples. You are fair, but will not sugarcoat the truth.

### Guidelines ###
Rather than invent or turn to the internet for answers, use the given context to formulate answers.
Whenever possible, use specific quotes from the transcripts. You may paraphrase these quotes to make
them more legible and readable.
When not quoting directly, summarize the main ideas contained in the context you are given. Be as
specific and direct as possible.
Finally, give specific suggestions about how the salesperson could handle real or hypothetical
situations, turning the trainers' advice into several concrete variations the salesperson could use.

The question is: {question}

Your response should be in the following format:
A summary of the most important advice found in the context (no more than 300 words).
3-4 key bullet points (no more than 200 words each).
References to the chunks that you used to answer the question.

Here are the chunks as well as some additional details about each one:
"#
        );

        prompt.push_str(CHUNK_DELIMITER);
        for (index, result) in results.iter().enumerate() {
            prompt.push_str(&format!("Chunk {}:\n", index));
            if let Some(trainer) = &result.transcript.trainer_name {
                prompt.push_str(&format!("Trainer: {}\n", trainer));
            }
            prompt.push_str(&format!("Chunk: {}\n", result.chunk.text));
            prompt.push_str(CHUNK_DELIMITER);
        }

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chunk, NewTranscript, Transcript};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn transcript(trainer_name: Option<&str>) -> Transcript {
        let metadata = NewTranscript {
            trainer_name: trainer_name.map(|t| t.to_string()),
            ..Default::default()
        };
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Transcript {
            id: Uuid::new_v4(),
            title: metadata.title,
            trainer_name: metadata.trainer_name,
            media_type: None,
            source_url: None,
            provide_source_link: false,
            active: true,
            total_chunks: 1,
            created_at: at,
            updated_at: at,
        }
    }

    fn scored(text: &str, trainer_name: Option<&str>) -> ScoredChunk {
        let transcript = transcript(trainer_name);
        ScoredChunk {
            chunk: Chunk::new(transcript.id, 0, text.to_string(), vec![1.0]),
            transcript,
            distance: 0.1,
        }
    }

    #[test]
    fn includes_question_and_chunk_blocks_in_order() {
        let results = vec![
            scored("Always ask discovery questions.", Some("Jordan")),
            scored("Silence is a closing tool.", Some("Riley")),
        ];
        let prompt = PromptBuilder::build("How do I open a cold call?", &results);

        assert!(prompt.contains("The question is: How do I open a cold call?"));
        assert!(prompt.contains("Chunk 0:\nTrainer: Jordan\nChunk: Always ask discovery questions.\n"));
        assert!(prompt.contains("Chunk 1:\nTrainer: Riley\nChunk: Silence is a closing tool.\n"));
        assert!(prompt.find("Chunk 0:").unwrap() < prompt.find("Chunk 1:").unwrap());
    }

    #[test]
    fn omits_trainer_line_when_absent() {
        let results = vec![scored("Anonymous advice.", None)];
        let prompt = PromptBuilder::build("question", &results);

        assert!(!prompt.contains("Trainer:"));
        assert!(prompt.contains("Chunk 0:\nChunk: Anonymous advice.\n"));
    }

    #[test]
    fn output_is_deterministic() {
        let results = vec![scored("Repeatable.", Some("Jordan"))];
        let a = PromptBuilder::build("same question", &results);
        let b = PromptBuilder::build("same question", &results);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_results_still_produce_the_preamble() {
        let prompt = PromptBuilder::build("lonely question", &[]);
        assert!(prompt.contains("lonely question"));
        assert!(prompt.ends_with(CHUNK_DELIMITER));
    }
}
