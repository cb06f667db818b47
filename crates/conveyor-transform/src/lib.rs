//! Transform algebra: invertible, composable byte/key transforms.
//!
//! A [`Transform<A, B>`] is a pure function from `A` to `B` with an inverse
//! `Transform<B, A>` such that `inverse.apply(f.apply(x)) == x` for every
//! valid `x`. Transforms compose via [`Compose`]; the inverse of a
//! composition reverses order: `~(f + g) = ~g + ~f`.
//!
//! Two flavors exist in name only — *Safe* transforms are documented to
//! never fail, *Trusted* transforms may return [`Error::Trusted`]. Both
//! share the same trait; the distinction is advisory, the way the source
//! system names `Transforms.Safe`/`Transforms.Trusted` as thin markers over
//! one underlying contract.

pub mod db_enum_name;
pub mod pathify;

pub use db_enum_name::DbEnumName;
pub use pathify::Pathify;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("transform failed: {0}")]
    Trusted(String),
}

/// An invertible transform from `A` to `B`.
pub trait Transform<A, B> {
    type Inverse: Transform<B, A>;

    fn apply(&self, input: A) -> Result<B, Error>;
    fn invert(&self) -> Self::Inverse;
}

/// Composition of two transforms: apply `F` then `G`.
#[derive(Clone, Copy, Debug)]
pub struct Compose<F, G>(pub F, pub G);

impl<A, B, C, F, G> Transform<A, C> for Compose<F, G>
where
    F: Transform<A, B>,
    G: Transform<B, C>,
{
    type Inverse = Compose<G::Inverse, F::Inverse>;

    fn apply(&self, input: A) -> Result<C, Error> {
        self.1.apply(self.0.apply(input)?)
    }

    fn invert(&self) -> Self::Inverse {
        Compose(self.1.invert(), self.0.invert())
    }
}

/// The identity transform, its own inverse.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl<A> Transform<A, A> for Identity {
    type Inverse = Identity;

    fn apply(&self, input: A) -> Result<A, Error> {
        Ok(input)
    }

    fn invert(&self) -> Identity {
        Identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy)]
    struct AddOne;
    #[derive(Clone, Copy)]
    struct SubOne;

    impl Transform<i64, i64> for AddOne {
        type Inverse = SubOne;
        fn apply(&self, input: i64) -> Result<i64, Error> {
            Ok(input + 1)
        }
        fn invert(&self) -> SubOne {
            SubOne
        }
    }
    impl Transform<i64, i64> for SubOne {
        type Inverse = AddOne;
        fn apply(&self, input: i64) -> Result<i64, Error> {
            Ok(input - 1)
        }
        fn invert(&self) -> AddOne {
            AddOne
        }
    }

    #[test]
    fn compose_applies_left_to_right() {
        let c = Compose(AddOne, AddOne);
        assert_eq!(c.apply(0).unwrap(), 2);
    }

    #[test]
    fn invert_of_compose_reverses_order_and_direction() {
        let c = Compose(AddOne, AddOne);
        let inv = c.invert();
        assert_eq!(inv.apply(2).unwrap(), 0);
    }
}
