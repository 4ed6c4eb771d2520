/// Splits `layers` around index `i`, returning the layers before it and a
/// mutable reference to layer `i` itself.
pub fn split_before<T>(layers: &mut [T], i: usize) -> (&[T], &mut T) {
    let (before, after) = layers.split_at_mut(i);
    (before, &mut after[0])
}

/// Splits `layers` around index `i`, returning a mutable reference to layer
/// `i` and the layers after it.
pub fn split_after<T>(layers: &mut [T], i: usize) -> (&mut T, &[T]) {
    let (before, after) = layers.split_at_mut(i + 1);
    (&mut before[i], after)
}
