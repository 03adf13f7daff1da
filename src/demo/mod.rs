//! Demo scene: a rotating caffeine molecule in ball-and-stick style

mod math3d;

use molraster::{Colix, EndCaps, Font, Graphics3D, HermiteCurve, Point3i, TubeDiameters};

use math3d::{project, Vec3};

/// Eye distance in angstroms
const CAMERA: f32 = 40.0;
/// Screen z of the molecule's center
const DEPTH_CENTER: f32 = 4000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    C,
    N,
    O,
    H,
}

impl Element {
    fn colix(self) -> Colix {
        match self {
            Element::C => Colix::GRAY,
            Element::N => Colix::BLUE,
            Element::O => Colix::RED,
            Element::H => Colix::WHITE,
        }
    }

    /// Ball radius in angstroms
    fn radius(self) -> f32 {
        match self {
            Element::C => 0.34,
            Element::N => 0.31,
            Element::O => 0.30,
            Element::H => 0.22,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Element::C => "C",
            Element::N => "N",
            Element::O => "O",
            Element::H => "H",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Atom {
    pub element: Element,
    pub position: Vec3,
}

#[derive(Debug, Clone)]
pub struct Molecule {
    pub name: &'static str,
    pub atoms: Vec<Atom>,
    pub bonds: Vec<(usize, usize)>,
}

impl Molecule {
    /// Caffeine heavy atoms plus the imidazole hydrogen, centered on the origin
    pub fn caffeine() -> Self {
        use Element::{C, H, N, O};
        let raw = [
            (N, -1.21, 0.70),  // 0 N1
            (C, -1.21, -0.70), // 1 C2
            (N, 0.00, -1.40),  // 2 N3
            (C, 1.21, -0.70),  // 3 C4
            (C, 1.21, 0.70),   // 4 C5
            (C, 0.00, 1.40),   // 5 C6
            (N, 2.54, 1.10),   // 6 N7
            (C, 3.35, 0.00),   // 7 C8
            (N, 2.54, -1.10),  // 8 N9
            (O, -2.26, -1.30), // 9 O2
            (O, 0.00, 2.62),   // 10 O6
            (C, -2.45, 1.42),  // 11 methyl on N1
            (C, 0.00, -2.85),  // 12 methyl on N3
            (C, 2.95, 2.45),   // 13 methyl on N7
            (H, 4.40, 0.00),   // 14 H8
        ];
        let count = raw.len() as f32;
        let (sx, sy) = raw
            .iter()
            .fold((0.0, 0.0), |(sx, sy), &(_, x, y)| (sx + x, sy + y));
        let center = Vec3::new(sx / count, sy / count, 0.0);
        let atoms = raw
            .iter()
            .map(|&(element, x, y)| Atom {
                element,
                position: Vec3::new(x, y, 0.0) - center,
            })
            .collect();
        let bonds = vec![
            (0, 1),
            (1, 2),
            (2, 3),
            (3, 4),
            (4, 5),
            (5, 0),
            (4, 6),
            (6, 7),
            (7, 8),
            (8, 3),
            (1, 9),
            (5, 10),
            (0, 11),
            (2, 12),
            (6, 13),
            (7, 14),
        ];
        Self {
            name: "caffeine",
            atoms,
            bonds,
        }
    }
}

/// Orientation and zoom of the demo camera
#[derive(Debug, Clone, Copy)]
pub struct View {
    pub rotate_x: f32,
    pub rotate_y: f32,
    /// Buffer pixels per angstrom at the molecule's center
    pub zoom: f32,
    pub width: i32,
    pub height: i32,
    pub show_labels: bool,
}

impl View {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            rotate_x: 0.4,
            rotate_y: 0.0,
            zoom: width.min(height) as f32 / 10.0,
            width,
            height,
            show_labels: false,
        }
    }

    /// Screen position and pixel scale of a model-space point
    fn to_screen(&self, p: Vec3) -> Option<(Point3i, f32)> {
        let r = p.rotate_y(self.rotate_y).rotate_x(self.rotate_x);
        let (x, y, perspective) = project(r, CAMERA)?;
        let point = Point3i::new(
            (self.width as f32 / 2.0 + x * self.zoom).round() as i32,
            (self.height as f32 / 2.0 - y * self.zoom).round() as i32,
            (DEPTH_CENTER + r.z * self.zoom).round() as i32,
        );
        Some((point, self.zoom * perspective))
    }
}

/// Draw the molecule into a frame that has already begun
pub fn render(g3d: &mut Graphics3D, molecule: &Molecule, view: &View) {
    let screen: Vec<_> = molecule
        .atoms
        .iter()
        .map(|atom| view.to_screen(atom.position))
        .collect();

    for (atom, placed) in molecule.atoms.iter().zip(&screen) {
        let Some((p, scale)) = *placed else {
            continue;
        };
        g3d.set_colix(atom.element.colix());
        g3d.fill_sphere((atom.element.radius() * 2.0 * scale) as i32, p.x, p.y, p.z);
    }

    for &(i, j) in &molecule.bonds {
        let (Some((a, scale)), Some((b, _))) = (screen[i], screen[j]) else {
            continue;
        };
        g3d.fill_cylinder_bicolor(
            molecule.atoms[i].element.colix().into(),
            molecule.atoms[j].element.colix().into(),
            EndCaps::None,
            (0.18 * scale) as i32,
            a,
            b,
        );
    }

    // Tube through the six-membered ring, as a backbone-style trace
    let ring: Vec<Point3i> = [0, 1, 2, 3, 4, 5]
        .iter()
        .filter_map(|&i| screen[i].map(|(p, _)| p))
        .collect();
    if ring.len() == 6 {
        g3d.set_colix(Colix::GOLD);
        let tube = TubeDiameters::uniform((view.zoom * 0.08).max(2.0) as i32);
        for k in 0..6 {
            let curve = HermiteCurve::new(
                ring[(k + 5) % 6],
                ring[k],
                ring[(k + 1) % 6],
                ring[(k + 2) % 6],
            );
            g3d.fill_hermite(&curve, tube);
        }
    }

    if view.show_labels {
        g3d.set_font(Font::new(8, true));
        g3d.set_colix(Colix::YELLOW);
        for (atom, placed) in molecule.atoms.iter().zip(&screen) {
            if let Some((p, _)) = placed {
                g3d.draw_string(atom.element.symbol(), p.x + 4, p.y - 4, p.z - 200);
            }
        }
    }

    g3d.set_font(Font::new(16, false));
    g3d.set_colix(Colix::WHITE);
    g3d.draw_string_on(molecule.name, 8, 24, 1, Colix::NAVY.into());
}
