//! Bulk arithmetic on a [`MapCollection`], parallel over maps.

use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

use common::non_null;
use common::parallel::{ParChunksMutAutoWithOffset, ParRowsZipAuto};
use rayon::prelude::*;

use super::MapCollection;

macro_rules! collection_scalar_op {
    ($trait:ident, $method:ident, |$a:ident, $b:ident| $body:expr) => {
        impl $trait<f32> for MapCollection {
            fn $method(&mut self, $b: f32) {
                self.values
                    .par_chunks_mut_auto()
                    .for_each(|(_, chunk)| {
                        for $a in chunk.iter_mut() {
                            *$a = $body;
                        }
                    });
            }
        }
    };
}

collection_scalar_op!(AddAssign, add_assign, |a, b| *a + b);
collection_scalar_op!(SubAssign, sub_assign, |a, b| *a - b);
collection_scalar_op!(MulAssign, mul_assign, |a, b| *a * b);
collection_scalar_op!(DivAssign, div_assign, |a, b| (*a as f64 / non_null(b as f64)) as f32);

macro_rules! collection_elementwise_op {
    ($trait:ident, $method:ident, |$a:ident, $b:ident| $body:expr) => {
        impl $trait<&MapCollection> for MapCollection {
            fn $method(&mut self, other: &MapCollection) {
                assert_eq!(
                    (self.num_maps, self.dimension),
                    (other.num_maps, other.dimension),
                    "Collections must have equal shape"
                );
                let dimension = self.dimension;
                self.values
                    .par_rows_zip_auto(&other.values, dimension)
                    .for_each(|(_, (dst, src))| {
                        for ($a, &$b) in dst.iter_mut().zip(src) {
                            *$a = $body;
                        }
                    });
            }
        }
    };
}

collection_elementwise_op!(AddAssign, add_assign, |a, b| *a + b);
collection_elementwise_op!(SubAssign, sub_assign, |a, b| *a - b);
collection_elementwise_op!(MulAssign, mul_assign, |a, b| *a * b);
collection_elementwise_op!(DivAssign, div_assign, |a, b| (*a as f64 / non_null(b as f64)) as f32);
