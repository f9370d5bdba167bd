use crate::score::Score;

const PERSONA: &str = "Eres un entrenador de élite muy motivador.";
const MAX_WORDS: usize = 15;
const TONE: &str = "con un tono deportivo y profesional";

/// One-shot prompt asking for a short comment on `name`'s score.
pub fn build_coach_prompt(name: &str, score: Score) -> String {
    format!(
        "{persona} El atleta {name} ha obtenido una puntuación de {score} sobre 100. \
         Dame un comentario corto (máximo {max_words} palabras) {tone} sobre este resultado.",
        persona = PERSONA,
        name = name,
        score = score,
        max_words = MAX_WORDS,
        tone = TONE,
    )
}
