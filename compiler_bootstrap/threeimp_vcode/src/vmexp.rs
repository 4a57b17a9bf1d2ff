//! The CPS instruction record and its flat pool.
//!
//! Dependency order between instructions is "next-pointer" based:
//! instructions hold ids of their successors, never offsets, so the
//! compiler can build the instruction graph bottom-up (tail-first).

use threeimp_value::Object;

/// Index into [`VCode`]'s flat instruction pool.
pub type VmExpId = usize;

/// One variant per CPS instruction. Field names mirror the register
/// machine's notation (`n`, `next`, `if-true`/`if-false`, ...).
#[derive(Debug, Clone, Copy)]
pub enum VmExp {
    Halt,
    ReferLocal { n: usize, next: VmExpId },
    ReferFree { n: usize, next: VmExpId },
    ReferGlobal { n: usize, next: VmExpId },
    Indirect { next: VmExpId },
    Constant { value: Object, next: VmExpId },
    Close { n_free: usize, body: VmExpId, next: VmExpId },
    Box { n: usize, next: VmExpId },
    Test { if_true: VmExpId, if_false: VmExpId },
    AssignLocal { n: usize, next: VmExpId },
    AssignFree { n: usize, next: VmExpId },
    AssignGlobal { n: usize, next: VmExpId },
    Conti { next: VmExpId },
    Nuate { saved_stack: Object, next: VmExpId },
    Frame { body: VmExpId, post_return: VmExpId },
    Argument { next: VmExpId },
    Apply,
    Return { n: usize },
    Shift { n: usize, m: usize, next: VmExpId },
    PInvoke { arg_count: usize, proc_id: usize, next: VmExpId },
}

/// The flat, append-only instruction pool. Owns the global-definition table
/// and the platform-procedure table alongside the instructions themselves.
#[derive(Debug, Default)]
pub struct VCode {
    exps: Vec<VmExp>,
}

macro_rules! ctor {
    ($name:ident, $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        pub fn $name(&mut self, $($field: $ty),*) -> VmExpId {
            self.push(VmExp::$variant { $($field),* })
        }
    };
}

impl VCode {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, exp: VmExp) -> VmExpId {
        let id = self.exps.len();
        self.exps.push(exp);
        id
    }

    pub fn new_vmx_halt(&mut self) -> VmExpId {
        self.push(VmExp::Halt)
    }

    ctor!(new_vmx_refer_local, ReferLocal { n: usize, next: VmExpId });
    ctor!(new_vmx_refer_free, ReferFree { n: usize, next: VmExpId });
    ctor!(new_vmx_refer_global, ReferGlobal { n: usize, next: VmExpId });
    ctor!(new_vmx_indirect, Indirect { next: VmExpId });
    ctor!(new_vmx_constant, Constant { value: Object, next: VmExpId });
    ctor!(new_vmx_close, Close { n_free: usize, body: VmExpId, next: VmExpId });
    ctor!(new_vmx_box, Box { n: usize, next: VmExpId });
    ctor!(new_vmx_test, Test { if_true: VmExpId, if_false: VmExpId });
    ctor!(new_vmx_assign_local, AssignLocal { n: usize, next: VmExpId });
    ctor!(new_vmx_assign_free, AssignFree { n: usize, next: VmExpId });
    ctor!(new_vmx_assign_global, AssignGlobal { n: usize, next: VmExpId });
    ctor!(new_vmx_conti, Conti { next: VmExpId });
    ctor!(new_vmx_nuate, Nuate { saved_stack: Object, next: VmExpId });
    ctor!(new_vmx_frame, Frame { body: VmExpId, post_return: VmExpId });
    ctor!(new_vmx_argument, Argument { next: VmExpId });
    ctor!(new_vmx_return, Return { n: usize });
    ctor!(new_vmx_shift, Shift { n: usize, m: usize, next: VmExpId });
    ctor!(new_vmx_pinvoke, PInvoke { arg_count: usize, proc_id: usize, next: VmExpId });

    pub fn new_vmx_apply(&mut self) -> VmExpId {
        self.push(VmExp::Apply)
    }

    pub fn get(&self, id: VmExpId) -> &VmExp {
        &self.exps[id]
    }

    pub fn len(&self) -> usize {
        self.exps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exps.is_empty()
    }

    /// Diagnostic listing of every instruction in pool order.
    pub fn dump_instructions(&self) -> String {
        let mut out = String::new();
        for (id, exp) in self.exps.iter().enumerate() {
            out.push_str(&format!("{id:>5}: {exp:?}\n"));
        }
        out
    }
}
