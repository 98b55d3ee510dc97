/// Integer offsets of a `radius x radius` square, visited in an outward
/// spiral starting at the origin.
pub fn spiral(radius: u32) -> Vec<(i32, i32)> {
    let r = radius as i64;
    let (mut x, mut y) = (0i64, 0i64);
    let (mut dx, mut dy) = (0i64, -1i64);

    let mut cells = Vec::with_capacity((r * r) as usize);

    for _ in 0..r * r {
        if -r < 2 * x && 2 * x <= r && -r < 2 * y && 2 * y <= r {
            cells.push((x as i32, y as i32));
        }

        if x == y || (x < 0 && x == -y) || (x > 0 && x == 1 - y) {
            let turned = (-dy, dx);
            dx = turned.0;
            dy = turned.1;
        }

        x += dx;
        y += dy;
    }

    cells
}

#[cfg(test)]
mod tests {
    use {super::*, std::collections::HashSet};

    #[test]
    fn small_spirals() {
        assert!(spiral(0).is_empty());
        assert_eq!(spiral(1), [(0, 0)]);
        assert_eq!(spiral(2), [(0, 0), (1, 0), (1, 1), (0, 1)]);
    }

    #[test]
    fn covers_square_once() {
        let cells = spiral(5);
        assert_eq!(cells.len(), 25);
        assert_eq!(cells[0], (0, 0));

        let unique: HashSet<_> = cells.iter().copied().collect();
        assert_eq!(unique.len(), 25);
        assert!(cells
            .iter()
            .all(|&(x, y)| x.abs() <= 2 && y.abs() <= 2));

        // Rings grow outwards.
        let ring = |&(x, y): &(i32, i32)| x.abs().max(y.abs());
        assert!(cells.windows(2).all(|w| ring(&w[0]) <= ring(&w[1])));
    }
}
