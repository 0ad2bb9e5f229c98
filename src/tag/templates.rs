//! Production templates of the Cocke–Minsky construction.
//!
//! A token ending in `$` is a symbol of the source label, `A$` becoming `A_{label}`. A
//! token `A!r` names the target entered when the scanned bit turns out to be `r`. `x` is
//! the separator. Each template lists its right-hand side for writing 0 and writing 1.

pub(crate) struct Template {
    pub lhs: &'static str,
    pub rhs: [&'static str; 2],
}

const fn same(lhs: &'static str, rhs: &'static str) -> Template {
    Template { lhs, rhs: [rhs, rhs] }
}

/// Head moves right: the right number is halved, the left one doubled plus the write bit.
pub(crate) const RIGHT: &[Template] = &[
    Template {
        lhs: "A$",
        rhs: ["C$ x", "C$ x c$ x"],
    },
    same("a$", "c$ x c$ x"),
    same("B$", "S$"),
    same("b$", "s$"),
    same("C$", "D1$ D0$"),
    same("c$", "d1$ d0$"),
    same("S$", "T1$ T0$"),
    same("s$", "t1$ t0$"),
];

/// Head moves left: the mirror image, with the halving done through `Y`/`y` pairs.
pub(crate) const LEFT: &[Template] = &[
    same("A$", "Z$"),
    same("a$", "z$"),
    Template {
        lhs: "B$",
        rhs: ["Y1$ Y0$", "Y1$ Y0$ y1$ y0$"],
    },
    same("b$", "y1$ y0$ y1$ y0$"),
    same("Z$", "D1$ D0$"),
    same("z$", "d1$ d0$"),
    same("Y1$", "T1$ x"),
    same("y1$", "t1$ x"),
    same("Y0$", "x T0$"),
    same("y0$", "x t0$"),
];

/// Parity dispatch into the next label, shared by both directions.
pub(crate) const DISPATCH: &[Template] = &[
    same("D1$", "A!1 x"),
    same("d1$", "a!1 x"),
    same("T1$", "B!1 x"),
    same("t1$", "b!1 x"),
    same("D0$", "x A!0 x"),
    same("d0$", "a!0 x"),
    same("T0$", "B!0 x"),
    same("t0$", "b!0 x"),
];
