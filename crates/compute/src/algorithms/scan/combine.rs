use std::ops::{Add, Mul};

/// An associative binary operator used to combine scan elements.
///
/// `combine(combine(a, b), c)` must equal `combine(a, combine(b, c))`.
/// Commutativity is not required: the scan always combines earlier elements
/// on the left.
pub trait Combine<T>: Send + Sync {
    fn combine(&self, lhs: &T, rhs: &T) -> T;
}

/// Addition.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sum;

impl<T> Combine<T> for Sum
where
    T: Add<Output = T> + Clone,
{
    fn combine(&self, lhs: &T, rhs: &T) -> T {
        lhs.clone() + rhs.clone()
    }
}

/// Multiplication. Matrix types make this non-commutative.
#[derive(Debug, Clone, Copy, Default)]
pub struct Product;

impl<T> Combine<T> for Product
where
    T: Mul<Output = T> + Clone,
{
    fn combine(&self, lhs: &T, rhs: &T) -> T {
        lhs.clone() * rhs.clone()
    }
}

impl<T, F> Combine<T> for F
where
    F: Fn(&T, &T) -> T + Send + Sync,
{
    fn combine(&self, lhs: &T, rhs: &T) -> T {
        self(lhs, rhs)
    }
}
