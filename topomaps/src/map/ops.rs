//! Elementwise arithmetic on [`Map`].

use std::ops::{
    Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign,
};

use common::non_null;

use super::{Map, assert_same_dimension};

macro_rules! map_assign_op {
    ($trait:ident, $method:ident, |$a:ident, $b:ident| $body:expr) => {
        impl $trait<&Map> for Map {
            fn $method(&mut self, other: &Map) {
                assert_same_dimension(self, other);
                for ($a, &$b) in self.values.iter_mut().zip(other.values.iter()) {
                    *$a = $body;
                }
            }
        }

        impl $trait<f32> for Map {
            fn $method(&mut self, $b: f32) {
                for $a in self.values.iter_mut() {
                    *$a = $body;
                }
            }
        }
    };
}

map_assign_op!(AddAssign, add_assign, |a, b| *a + b);
map_assign_op!(SubAssign, sub_assign, |a, b| *a - b);
map_assign_op!(MulAssign, mul_assign, |a, b| *a * b);
map_assign_op!(DivAssign, div_assign, |a, b| (*a as f64 / non_null(b as f64)) as f32);

macro_rules! map_binary_op {
    ($trait:ident, $method:ident, $assign:ident) => {
        impl $trait<&Map> for &Map {
            type Output = Map;

            fn $method(self, other: &Map) -> Map {
                let mut result = self.clone();
                result.$assign(other);
                result
            }
        }

        impl $trait<f32> for &Map {
            type Output = Map;

            fn $method(self, other: f32) -> Map {
                let mut result = self.clone();
                result.$assign(other);
                result
            }
        }
    };
}

map_binary_op!(Add, add, add_assign);
map_binary_op!(Sub, sub, sub_assign);
map_binary_op!(Mul, mul, mul_assign);
map_binary_op!(Div, div, div_assign);

impl Neg for &Map {
    type Output = Map;

    fn neg(self) -> Map {
        Map::from_vec(self.values.iter().map(|&v| -v).collect())
    }
}
