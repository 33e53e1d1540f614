use crate::dictionary::Dictionary;
use crate::tokenizer::tokenize;
use ndarray::Array1;

/// Map a URL to exactly `max_words` dictionary ids.
///
/// Unknown tokens become 0, sequences longer than `max_words` keep their
/// first `max_words` ids and shorter ones are right-padded with 0.
pub fn vectorize(url: &str, dictionary: &Dictionary, max_words: usize) -> Array1<i64> {
    let mut vector = Array1::<i64>::zeros(max_words);
    for (slot, token) in vector.iter_mut().zip(tokenize(url)) {
        *slot = i64::from(dictionary.id(&token));
    }
    vector
}
