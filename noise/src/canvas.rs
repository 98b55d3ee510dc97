/// Row-major grid of `width` x `height` values.
#[derive(Clone, Debug, PartialEq)]
pub struct Canvas<T> {
    width: usize,
    height: usize,
    values: Vec<T>,
}

impl<T> Canvas<T> {
    pub fn new(width: usize, height: usize, value: T) -> Self
    where
        T: Clone,
    {
        Canvas {
            width,
            height,
            values: vec![value; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn row(&self, n: usize) -> &[T] {
        let start = self.width * n;
        &self.values[start..start + self.width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        self.values.chunks_exact(self.width.max(1))
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x < self.width && y < self.height {
            Some(&self.values[x + y * self.width])
        } else {
            None
        }
    }

    /// Panics if the cell is out of bounds.
    pub fn pixel(&mut self, x: usize, y: usize) -> &mut T {
        assert!(x < self.width && y < self.height);
        &mut self.values[x + y * self.width]
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.values.iter()
    }

    pub fn map_ref<U>(&self, f: impl FnMut(&T) -> U) -> Canvas<U> {
        Canvas {
            width: self.width,
            height: self.height,
            values: self.values.iter().map(f).collect(),
        }
    }
}

impl Canvas<u8> {
    /// Saves canvas as grayscale PNG.
    pub fn save_to_image(
        &self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<(), image::ImageError> {
        use image::{save_buffer_with_format, ColorType, ImageFormat};
        save_buffer_with_format(
            path,
            &self.values,
            self.width as u32,
            self.height as u32,
            ColorType::L8,
            ImageFormat::Png,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangular_addressing() {
        let mut canvas = Canvas::new(3, 2, 0u8);
        *canvas.pixel(2, 1) = 7;

        assert_eq!(canvas.get(2, 1), Some(&7));
        assert_eq!(canvas.get(3, 0), None);
        assert_eq!(canvas.get(0, 2), None);
        assert_eq!(canvas.row(1), [0, 0, 7]);
        assert_eq!(canvas.rows().count(), 2);

        let doubled = canvas.map_ref(|v| u32::from(*v) * 2);
        assert_eq!(doubled.get(2, 1), Some(&14));
    }
}
