//! Re-entrant Marsaglia UNI pseudo-random number generator.
//!
//! Transliterated from the original Fortran-derived C (`myuni.c`), but held
//! as an owned value rather than process statics: two independent [`Rng`]s
//! seeded identically produce identical streams, which is what lets a search
//! be replayed bit-for-bit and what lets two searches run concurrently
//! without sharing state.

/// A self-contained Marsaglia UNI generator. Must be seeded with
/// [`Rng::new`] before drawing; there is no "unseeded" state to draw from.
#[derive(Clone, Debug)]
pub struct Rng {
    u: [f64; 97],
    c: f64,
    cd: f64,
    cm: f64,
    ui: usize,
    uj: usize,
}

impl Rng {
    /// Seed the generator from a single integer in `[0, 900_000_000]`.
    ///
    /// Decomposes `seed` into the four Marsaglia seeds `(i, j, k, l)` exactly
    /// as the original `rinit` does, then runs the 97-table bootstrap.
    pub fn new(seed: i64) -> Self {
        assert!(
            (0..=900_000_000).contains(&seed),
            "rng seed {seed} out of range [0, 900000000]"
        );

        let ij = seed / 30082;
        let kl = seed - 30082 * ij;

        let i = (ij / 177) % 177 + 2;
        let j = (ij % 177) + 2;
        let k = (kl / 169) % 178 + 1;
        let l = kl % 169;

        assert!((1..=178).contains(&i), "rinit: i={i} out of range");
        assert!((1..=178).contains(&j), "rinit: j={j} out of range");
        assert!((1..=178).contains(&k), "rinit: k={k} out of range");
        assert!((0..=168).contains(&l), "rinit: l={l} out of range");
        assert!(!(i == 1 && j == 1 && k == 1), "rinit: (1,1,1) not allowed for 1st 3 seeds");

        Self::rstart(i, j, k, l)
    }

    fn rstart(mut i: i64, mut j: i64, mut k: i64, mut l: i64) -> Self {
        let mut u = [0.0f64; 97];
        for slot in u.iter_mut() {
            let mut s = 0.0;
            let mut t = 0.5;
            for _ in 0..24 {
                let m = ((i * j % 179) * k) % 179;
                i = j;
                j = k;
                k = m;
                l = (53 * l + 1) % 169;
                if l * m % 64 >= 32 {
                    s += t;
                }
                t *= 0.5;
            }
            *slot = s;
        }
        Rng {
            u,
            c: 362436.0 / 16777216.0,
            cd: 7654321.0 / 16777216.0,
            cm: 16777213.0 / 16777216.0,
            ui: 97,
            uj: 33,
        }
    }

    /// Draw the next value in `[0, 1)`.
    pub fn uni(&mut self) -> f64 {
        let mut luni = self.u[self.ui - 1] - self.u[self.uj - 1];
        if luni < 0.0 {
            luni += 1.0;
        }
        self.u[self.ui - 1] = luni;

        self.ui -= 1;
        if self.ui == 0 {
            self.ui = 97;
        }
        self.uj -= 1;
        if self.uj == 0 {
            self.uj = 97;
        }

        self.c -= self.cd;
        if self.c < 0.0 {
            self.c += self.cm;
        }

        luni -= self.c;
        if luni < 0.0 {
            luni += 1.0;
        }
        luni
    }

    /// A uniform integer in `[0, u]`, derived from [`Rng::uni`].
    pub fn randpint(&mut self, u: i64) -> i64 {
        assert!(u >= 0, "randpint: upper bound must be non-negative, got {u}");
        let draw = self.uni();
        let scaled = (draw * (u as f64 + 1.0)).floor() as i64;
        scaled.min(u)
    }
}
