use super::types::RerankCandidate;

pub fn rerank_prompt(text: &str, candidates: &[RerankCandidate], task: Option<&str>) -> String {
    let listing = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| {
            format!(
                "{}. {}: {} (similarity {:.2})",
                i + 1,
                c.name,
                c.description,
                c.similarity
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let task = task.unwrap_or("classification");

    format!(
        r#"You classify excerpts of psychiatric clinical notes.

Task: {task}. Score how well each candidate class fits the excerpt.

Excerpt:
"{text}"

Candidates, in embedding-similarity order:
{listing}

Judge by clinical meaning, not wording overlap. Negation matters: "denies SI" is not "SI present".
Give every candidate a score between 0.0 and 1.0 with a one-sentence reason.

Answer with JSON only:
{{"rankings": [{{"class": "<candidate name>", "score": 0.0, "reasoning": "<reason>"}}]}}"#
    )
}

pub fn validation_prompt(text: &str, class_name: &str, spec: &serde_json::Value) -> String {
    let conditions =
        serde_json::to_string_pretty(spec).unwrap_or_else(|_| spec.to_string());

    format!(
        r#"You check psychiatric clinical note excerpts against documentation criteria.

The excerpt was classified as "{class_name}". Decide whether it satisfies the required conditions below.

Excerpt:
"{text}"

Required conditions:
{conditions}

AND groups need every condition, OR groups need at least one. Treat negated findings as not met.

Answer with JSON only:
{{"is_valid": true, "score": 0.0, "conditions_met": [], "conditions_not_met": [], "explanation": "<one sentence>"}}"#
    )
}
