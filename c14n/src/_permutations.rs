/// Call `f` on every permutation of `values` (Heap's algorithm),
/// stopping at the first error.
pub fn for_each_permutation_of<T, F, E>(values: &mut [T], mut f: F) -> Result<(), E>
where
    F: FnMut(&[T]) -> Result<(), E>,
{
    if values.is_empty() {
        Ok(())
    } else {
        permutations(values, &mut f, values.len())
    }
}

// https://www.geeksforgeeks.org/heaps-algorithm-for-generating-permutations/
fn permutations<T, F, E>(values: &mut [T], f: &mut F, size: usize) -> Result<(), E>
where
    F: FnMut(&[T]) -> Result<(), E>,
{
    if size == 1 {
        f(values)
    } else {
        for i in 0..size {
            permutations(values, f, size - 1)?;
            if size % 2 == 1 {
                values.swap(0, size - 1);
            } else {
                values.swap(i, size - 1);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;

    fn all_permutations(mut a: Vec<i32>) -> HashSet<Vec<i32>> {
        let mut got = HashSet::new();
        for_each_permutation_of(&mut a, |p| -> Result<(), ()> {
            got.insert(p.to_vec());
            Ok(())
        })
        .unwrap();
        got
    }

    #[test]
    fn check_empty() {
        assert!(all_permutations(vec![]).is_empty());
    }

    #[test]
    fn check_1() {
        let exp = [vec![1]].into_iter().collect::<HashSet<_>>();
        assert_eq!(all_permutations(vec![1]), exp);
    }

    #[test]
    fn check_123() {
        let exp = [
            vec![1, 2, 3],
            vec![1, 3, 2],
            vec![2, 1, 3],
            vec![2, 3, 1],
            vec![3, 1, 2],
            vec![3, 2, 1],
        ]
        .into_iter()
        .collect::<HashSet<_>>();
        assert_eq!(all_permutations(vec![1, 2, 3]), exp);
    }

    #[test]
    fn check_count() {
        assert_eq!(all_permutations(vec![1, 2, 3, 4, 5]).len(), 120);
    }

    #[test]
    fn stops_at_first_error() {
        let mut a = [1, 2, 3, 4];
        let mut calls = 0;
        let res = for_each_permutation_of(&mut a, |_| {
            calls += 1;
            if calls == 3 {
                Err("stop")
            } else {
                Ok(())
            }
        });
        assert_eq!(res, Err("stop"));
        assert_eq!(calls, 3);
    }
}
