use faer_core::{MatMut, MatRef};

use crate::{
    method::{Coupling, Ctx, Stencil},
    mesh::{Dimensionality, Direction},
    Float,
};

mod operator;

pub use operator::{Operator, OperatorKind, Parameters};

/// Values around one cell of the pre-step buffer. On a 1-D grid the y
/// neighbours are the cell itself.
#[derive(Debug, Clone, Copy)]
struct Neighbours {
    c: Float,
    xm: Float,
    xp: Float,
    ym: Float,
    yp: Float,
}

impl Neighbours {
    fn at(ctx: &Ctx<'_>, u: MatRef<'_, Float>, i: usize, j: usize) -> Self {
        Self {
            c: u.read(i, j),
            xm: u.read(ctx.behind(Direction::X, i), j),
            xp: u.read(ctx.ahead(Direction::X, i), j),
            ym: u.read(i, ctx.behind(Direction::Y, j)),
            yp: u.read(i, ctx.ahead(Direction::Y, j)),
        }
    }

    // backward (upwind for positive speed) differences, undivided
    fn bx(&self) -> Float {
        self.c - self.xm
    }

    fn by(&self) -> Float {
        self.c - self.ym
    }

    // central second differences, undivided
    fn cxx(&self) -> Float {
        self.xp - 2.0 * self.c + self.xm
    }

    fn cyy(&self) -> Float {
        self.yp - 2.0 * self.c + self.ym
    }
}

/// Visits every cell updated by a stencil.
fn for_each_cell(ctx: &Ctx<'_>, one_sided: bool, mut f: impl FnMut(usize, usize)) {
    let ys = ctx.span(Direction::Y, one_sided);
    for i in ctx.span(Direction::X, one_sided) {
        for j in ys.clone() {
            f(i, j)
        }
    }
}

/// First-order upwind advection at a constant speed `c >= 0`, applied along
/// every axis and to each field separately.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearConvection {
    pub speed: Float,
}

impl Stencil for LinearConvection {
    fn name(&self) -> &'static str {
        "linear convection"
    }

    fn coupling(&self, _dims: Dimensionality) -> Coupling {
        Coupling::Independent
    }

    fn one_sided(&self, dims: Dimensionality) -> bool {
        dims == Dimensionality::One
    }

    fn numbers(&self, ctx: &Ctx<'_>) -> Vec<(&'static str, Float)> {
        vec![("courant", self.speed * ctx.dt / ctx.dx())]
    }

    fn apply(&self, ctx: Ctx<'_>, old: &[MatRef<'_, Float>], new: &mut [MatMut<'_, Float>]) {
        let rx = self.speed * ctx.dt / ctx.dx();
        let ry = ctx.dy().map_or(0.0, |dy| self.speed * ctx.dt / dy);
        let planar = ctx.planar();
        let one_sided = self.one_sided(ctx.grid.dims());

        let schema = |n: &Neighbours| -> Float {
            let v = n.c - rx * n.bx();
            if planar {
                v - ry * n.by()
            } else {
                v
            }
        };

        for (u, v) in old.iter().zip(new.iter_mut()) {
            for_each_cell(&ctx, one_sided, |i, j| {
                v.write(i, j, schema(&Neighbours::at(&ctx, *u, i, j)))
            });
        }
    }
}

/// Upwind advection where the field carries itself: the advection speed is
/// the local pre-step value. On a 2-D grid the two fields are the velocity
/// components `(u, v)`; `u` advects along x and `v` along y.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NonlinearConvection;

impl Stencil for NonlinearConvection {
    fn name(&self) -> &'static str {
        "nonlinear convection"
    }

    fn coupling(&self, dims: Dimensionality) -> Coupling {
        match dims {
            Dimensionality::One => Coupling::Independent,
            Dimensionality::Two => Coupling::Vector(2),
        }
    }

    fn one_sided(&self, dims: Dimensionality) -> bool {
        dims == Dimensionality::One
    }

    fn apply(&self, ctx: Ctx<'_>, old: &[MatRef<'_, Float>], new: &mut [MatMut<'_, Float>]) {
        let rx = ctx.dt / ctx.dx();
        let one_sided = self.one_sided(ctx.grid.dims());

        match ctx.dy() {
            None => {
                let schema = |n: &Neighbours| n.c - n.c * rx * n.bx();
                for (u, v) in old.iter().zip(new.iter_mut()) {
                    for_each_cell(&ctx, one_sided, |i, j| {
                        v.write(i, j, schema(&Neighbours::at(&ctx, *u, i, j)))
                    });
                }
            }
            Some(dy) => {
                let ry = ctx.dt / dy;
                let schema = |a: Float, b: Float, n: &Neighbours| n.c - a * rx * n.bx() - b * ry * n.by();
                let (u, v) = (old[0], old[1]);
                for (w, out) in old.iter().zip(new.iter_mut()) {
                    for_each_cell(&ctx, one_sided, |i, j| {
                        let n = Neighbours::at(&ctx, *w, i, j);
                        out.write(i, j, schema(u.read(i, j), v.read(i, j), &n))
                    });
                }
            }
        }
    }
}

/// Explicit diffusion with the central second difference along every axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Diffusion {
    pub viscosity: Float,
}

impl Stencil for Diffusion {
    fn name(&self) -> &'static str {
        "diffusion"
    }

    fn coupling(&self, _dims: Dimensionality) -> Coupling {
        Coupling::Independent
    }

    fn numbers(&self, ctx: &Ctx<'_>) -> Vec<(&'static str, Float)> {
        vec![("diffusion number", diffusion_number(self.viscosity, ctx))]
    }

    fn apply(&self, ctx: Ctx<'_>, old: &[MatRef<'_, Float>], new: &mut [MatMut<'_, Float>]) {
        let sx = self.viscosity * ctx.dt / (ctx.dx() * ctx.dx());
        let sy = ctx.dy().map_or(0.0, |dy| self.viscosity * ctx.dt / (dy * dy));
        let planar = ctx.planar();

        let schema = |n: &Neighbours| -> Float {
            let v = n.c + sx * n.cxx();
            if planar {
                v + sy * n.cyy()
            } else {
                v
            }
        };

        for (u, v) in old.iter().zip(new.iter_mut()) {
            for_each_cell(&ctx, false, |i, j| {
                v.write(i, j, schema(&Neighbours::at(&ctx, *u, i, j)))
            });
        }
    }
}

/// Burgers-type update: nonlinear upwind convection plus diffusion. Scalar on
/// a 1-D grid, coupled `(u, v)` on a 2-D grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvectionDiffusion {
    pub viscosity: Float,
}

impl Stencil for ConvectionDiffusion {
    fn name(&self) -> &'static str {
        "convection-diffusion"
    }

    fn coupling(&self, dims: Dimensionality) -> Coupling {
        NonlinearConvection.coupling(dims)
    }

    fn numbers(&self, ctx: &Ctx<'_>) -> Vec<(&'static str, Float)> {
        vec![("diffusion number", diffusion_number(self.viscosity, ctx))]
    }

    fn apply(&self, ctx: Ctx<'_>, old: &[MatRef<'_, Float>], new: &mut [MatMut<'_, Float>]) {
        let (dt, nu, dx) = (ctx.dt, self.viscosity, ctx.dx());

        match ctx.dy() {
            None => {
                let schema = |n: &Neighbours| {
                    n.c - n.c * dt / dx * n.bx() + nu * dt / (dx * dx) * n.cxx()
                };
                for (u, v) in old.iter().zip(new.iter_mut()) {
                    for_each_cell(&ctx, false, |i, j| {
                        v.write(i, j, schema(&Neighbours::at(&ctx, *u, i, j)))
                    });
                }
            }
            Some(dy) => {
                let schema = |a: Float, b: Float, n: &Neighbours| {
                    n.c + dt
                        * (-a / dx * n.bx() - b / dy * n.by()
                            + nu * (n.cxx() / (dx * dx) + n.cyy() / (dy * dy)))
                };
                let (u, v) = (old[0], old[1]);
                for (w, out) in old.iter().zip(new.iter_mut()) {
                    for_each_cell(&ctx, false, |i, j| {
                        let n = Neighbours::at(&ctx, *w, i, j);
                        out.write(i, j, schema(u.read(i, j), v.read(i, j), &n))
                    });
                }
            }
        }
    }
}

fn diffusion_number(viscosity: Float, ctx: &Ctx<'_>) -> Float {
    viscosity * ctx.dt / (ctx.dx() * ctx.dx())
}
