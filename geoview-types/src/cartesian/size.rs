use num_traits::{FromPrimitive, NumCast};
use serde::{Deserialize, Serialize};

/// Width and height of a rectangular area, e.g. the pixel size of a viewport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size<Num = u32> {
    width: Num,
    height: Num,
}

impl<Num: num_traits::Num + FromPrimitive + PartialOrd + Copy + NumCast> Size<Num> {
    /// Creates a new size.
    pub const fn new(width: Num, height: Num) -> Self {
        Self { width, height }
    }

    /// Width.
    pub fn width(&self) -> Num {
        self.width
    }

    /// Height.
    pub fn height(&self) -> Num {
        self.height
    }

    /// Returns true if either of the dimensions is zero.
    pub fn is_zero(&self) -> bool {
        self.width.is_zero() || self.height.is_zero()
    }

    /// Converts the size into a size with a different numeric type. Returns `None` if a value
    /// does not fit into the target type.
    pub fn cast<T: num_traits::Num + FromPrimitive + PartialOrd + Copy + NumCast>(
        &self,
    ) -> Option<Size<T>> {
        Some(Size {
            width: NumCast::from(self.width)?,
            height: NumCast::from(self.height)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size() {
        assert!(Size::new(0u32, 10).is_zero());
        assert!(Size::new(10u32, 0).is_zero());
        assert!(!Size::new(1u32, 1).is_zero());
    }

    #[test]
    fn cast() {
        let size = Size::new(640u32, 480);
        let float: Size<f64> = size.cast().expect("fits into f64");
        assert_eq!(float.width(), 640.0);
        assert_eq!(float.height(), 480.0);

        assert!(Size::new(-1i32, 5).cast::<u32>().is_none());
    }
}
