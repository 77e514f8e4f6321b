use crate::content::Question;

/// Canonical form used when comparing category ids and difficulties.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Checks whether a question's category id matches the selected category id.
///
/// Content files are authored by hand and category ids drift ("SCIENCE" vs
/// "Science & Nature"), so matching is tolerant: after normalization the two
/// ids match if they are equal or if either one contains the other.
/// Containment is only considered when the shorter id is non-empty.
///
/// # Arguments
///
/// * `question_category`: The category id stored on the question.
/// * `selected_category`: The id of the category the player picked.
///
/// # Returns
///
/// `true` if the question belongs to the selected category.
pub fn categories_match(question_category: &str, selected_category: &str) -> bool {
    let question_category = normalize(question_category);
    let selected_category = normalize(selected_category);

    if question_category == selected_category {
        return true;
    }

    if question_category.is_empty() || selected_category.is_empty() {
        return false;
    }

    question_category.contains(&selected_category) || selected_category.contains(&question_category)
}

/// Difficulty must match exactly after normalization.
pub fn difficulties_match(question_difficulty: &str, selected_difficulty: &str) -> bool {
    normalize(question_difficulty) == normalize(selected_difficulty)
}

/// Questions of `questions` that belong to the partition of `category_id` at `difficulty`.
pub fn partition_pool<'a>(
    questions: &'a [Question],
    category_id: &str,
    difficulty: &str,
) -> Vec<&'a Question> {
    questions
        .iter()
        .filter(|q| {
            categories_match(&q.category_id, category_id)
                && difficulties_match(&q.difficulty, difficulty)
        })
        .collect()
}
