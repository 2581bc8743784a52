use std::iter::FromIterator;

/// Converts an iterator into a vector.
///
/// Useful when you need to cache the result of an iterator for future use.
pub fn to_vec<T, I: Iterator<Item = T> + Sized>(iter: I) -> Vec<T> {
    FromIterator::from_iter(iter)
}

/// Converts a result iterator into a vector result, stopping at the first error.
pub fn to_vec_result<T, Err, I: Iterator<Item = Result<T, Err>> + Sized>(
    iter: I,
) -> Result<Vec<T>, Err> {
    FromIterator::from_iter(iter)
}

/// Yields the items of a result iterator up to the first error, which is
/// handed to `on_error` instead of being returned.
///
/// Used where a partially read sequence is still worth showing, e.g. a track
/// that is truncated halfway through.
pub fn until_error<T, Err, I: Iterator<Item = Result<T, Err>> + Sized>(
    iter: I,
    mut on_error: impl FnMut(Err),
) -> impl Iterator<Item = T> {
    iter.map_while(move |item| match item {
        Ok(item) => Some(item),
        Err(e) => {
            on_error(e);
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use crate::{
        pipe,
        sequence::{to_vec, to_vec_result, until_error},
    };

    #[test]
    fn until_error_keeps_items_before_the_error() {
        let mut errors = Vec::new();
        let items = vec![Ok(1), Ok(2), Err("truncated"), Ok(3)];
        let kept = pipe!(items.into_iter()|>until_error(|e| errors.push(e))|>to_vec());

        assert_eq!(kept, vec![1, 2]);
        assert_eq!(errors, vec!["truncated"]);
    }

    #[test]
    fn to_vec_result_stops_at_the_first_error() {
        let items: Vec<Result<u8, &str>> = vec![Ok(1), Err("corrupt"), Ok(3)];
        assert_eq!(pipe!(items.into_iter()|>to_vec_result()), Err("corrupt"));
    }
}
