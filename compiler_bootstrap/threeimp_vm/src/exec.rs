//! The instruction-dispatch loop.
//! A direct translation of `ss-core/vm.cc`'s `sync_execute_subr`, except the
//! tail-recursive `VM` function from *Three Implementations of Scheme*
//! becomes a `loop`, as the original C++ already does.

use threeimp_common::ThreeImpError;
use threeimp_memory::Heap;
use threeimp_value::{closure_entry, closure_free, make_box, make_closure, make_vector, set_box, unbox, vector_slots, Object};
use threeimp_vcode::{ArgView, GlobalTable, PlatformProcTable, VCode, VSubr, VmExp, VmExpId};

use crate::config::VmConfig;
use crate::vthread::VThread;

/// Owns the single [`VThread`] and backing [`Heap`] of one interpreter
/// instance.
pub struct Vm {
    pub thread: VThread,
    pub heap: Heap,
    pub config: VmConfig,
    globals: Vec<Object>,
}

impl Vm {
    pub fn new(config: VmConfig) -> Self {
        let thread = VThread::new(config.stack_capacity);
        let heap = Heap::new(config.heap_pages);
        Self { thread, heap, config, globals: Vec::new() }
    }

    /// Write every global's definition-record initializer into the
    /// runtime globals vector, growing it to `table.count()` first and
    /// leaving slots with no initializer at the `undefined` singleton.
    pub fn initialize_platform_globals(&mut self, table: &GlobalTable) {
        if self.globals.len() < table.count() {
            self.globals.resize(table.count(), Object::UNDEFINED);
        }
        for (id, def) in table.iter() {
            if let Some(v) = def.initializer {
                self.globals[id] = v;
            }
        }
    }

    /// Run every top-level entry of `subr` to `Halt`, in order, returning
    /// each result. `code` is mutable because `Conti` synthesizes fresh
    /// `ReferLocal`/`Nuate`/`Return` instructions into the shared pool at
    /// runtime, exactly as `ss-core/vm.cc`'s `continuation()` does.
    pub fn execute_subr(
        &mut self,
        code: &mut VCode,
        procs: &PlatformProcTable,
        subr: &VSubr,
    ) -> Result<Vec<Object>, ThreeImpError> {
        let mut results = Vec::with_capacity(subr.entry_ids.len());
        for &entry in &subr.entry_ids {
            self.thread.regs.x = entry;
            let result = self.run(code, procs)?;
            debug_assert_eq!(self.thread.regs.s, 0, "top-level form left the stack non-empty");
            debug_assert_eq!(self.thread.regs.f, 0, "top-level form left the frame pointer non-zero");
            results.push(result);
        }
        Ok(results)
    }

    /// Run from the current `x` register to `Halt`: a straight loop over
    /// the next-id pointer, no reordering.
    fn run(&mut self, code: &mut VCode, procs: &PlatformProcTable) -> Result<Object, ThreeImpError> {
        loop {
            #[cfg(feature = "trace-exec")]
            log::trace!(
                "x={} a={:?} f={} s={} c={:?}",
                self.thread.regs.x, self.thread.regs.a, self.thread.regs.f, self.thread.regs.s, self.thread.regs.c
            );

            match *code.get(self.thread.regs.x) {
                VmExp::Halt => return Ok(self.thread.regs.a),

                VmExp::ReferLocal { n, next } => {
                    self.thread.regs.a = self.thread.stack.index(self.thread.regs.f, n);
                    self.thread.regs.x = next;
                }
                VmExp::ReferFree { n, next } => {
                    self.thread.regs.a = self.closure_slot(self.thread.regs.c, n)?;
                    self.thread.regs.x = next;
                }
                VmExp::ReferGlobal { n, next } => {
                    self.thread.regs.a = *self
                        .globals
                        .get(n)
                        .ok_or_else(|| ThreeImpError::runtime_lookup(format!("global slot {n} out of range")))?;
                    self.thread.regs.x = next;
                }
                VmExp::Indirect { next } => {
                    let a = self.thread.regs.a;
                    if self.config.typecheck && !a.is_box() {
                        return Err(ThreeImpError::runtime_type(format!(
                            "indirect: expected a box, found a {}",
                            a.kind()
                        )));
                    }
                    self.thread.regs.a = unbox(a);
                    self.thread.regs.x = next;
                }
                VmExp::Constant { value, next } => {
                    self.thread.regs.a = value;
                    self.thread.regs.x = next;
                }
                VmExp::Close { n_free, body, next } => {
                    let s = self.thread.regs.s;
                    self.thread.regs.a = self.build_closure(body, n_free, s)?;
                    self.thread.regs.s = s - n_free;
                    self.thread.regs.x = next;
                }
                VmExp::Box { n, next } => {
                    let f = self.thread.regs.f;
                    let current = self.thread.stack.index(f, n);
                    let boxed = make_box(&self.heap, current)?;
                    self.thread.stack.index_set(f, n, boxed);
                    self.thread.regs.x = next;
                }
                VmExp::Test { if_true, if_false } => {
                    self.thread.regs.x = if self.thread.regs.a == Object::FALSE { if_false } else { if_true };
                }
                VmExp::AssignLocal { n, next } => {
                    let cell = self.thread.stack.index(self.thread.regs.f, n);
                    self.assign_box(cell)?;
                    self.thread.regs.x = next;
                }
                VmExp::AssignFree { n, next } => {
                    let cell = self.closure_slot(self.thread.regs.c, n)?;
                    self.assign_box(cell)?;
                    self.thread.regs.x = next;
                }
                VmExp::AssignGlobal { n, next } => {
                    if n >= self.globals.len() {
                        self.globals.resize(n + 1, Object::UNDEFINED);
                    }
                    self.globals[n] = self.thread.regs.a;
                    self.thread.regs.x = next;
                }
                VmExp::Conti { next } => {
                    self.thread.regs.a = self.continuation(code, self.thread.regs.s)?;
                    self.thread.regs.x = next;
                }
                VmExp::Nuate { saved_stack, next } => {
                    self.thread.regs.s = self.restore_stack(saved_stack)?;
                    self.thread.regs.x = next;
                }
                VmExp::Frame { body, post_return } => {
                    // Pushed in this order: `c`, then `f`, then the return
                    // address, so the return address lands on top -- see
                    // `Return`'s `index(s, 0)`.
                    let mut s = self.thread.regs.s;
                    s = self.thread.stack.push(self.thread.regs.c, s);
                    s = self.thread.stack.push(Object::integer(self.thread.regs.f as i64)?, s);
                    s = self.thread.stack.push(Object::integer(post_return as i64)?, s);
                    self.thread.regs.s = s;
                    self.thread.regs.x = body;
                }
                VmExp::Argument { next } => {
                    self.thread.regs.s = self.thread.stack.push(self.thread.regs.a, self.thread.regs.s);
                    self.thread.regs.x = next;
                }
                VmExp::Apply => {
                    let c = self.thread.regs.a;
                    if self.config.typecheck && !c.is_closure() {
                        return Err(ThreeImpError::runtime_type(format!(
                            "apply: expected a procedure, found a {}",
                            c.kind()
                        )));
                    }
                    self.thread.regs.x = closure_entry(c) as usize;
                    self.thread.regs.f = self.thread.regs.s;
                    self.thread.regs.c = c;
                }
                VmExp::Return { n } => {
                    let s = self.thread.regs.s - n;
                    let ret_x = self.thread.stack.index(s, 0);
                    let ret_f = self.thread.stack.index(s, 1);
                    self.thread.regs.c = self.thread.stack.index(s, 2);
                    self.thread.regs.x = ret_x
                        .as_integer()
                        .ok_or_else(|| ThreeImpError::runtime_type("return: corrupt saved instruction pointer"))?
                        as usize;
                    self.thread.regs.f = ret_f
                        .as_integer()
                        .ok_or_else(|| ThreeImpError::runtime_type("return: corrupt saved frame pointer"))?
                        as usize;
                    self.thread.regs.s = s - 3;
                }
                VmExp::Shift { n, m, next } => {
                    self.thread.regs.s = self.shift_args(n, m, self.thread.regs.s);
                    self.thread.regs.x = next;
                }
                VmExp::PInvoke { arg_count, proc_id, next } => {
                    // `ArgView`'s index 0 is the first-evaluated source
                    // argument; the compiler pushes p/invoke arguments in
                    // reverse so that `index(s, i)` walking `i` upward
                    // already yields left-to-right order (see
                    // `threeimp_compiler::lower`).
                    let s = self.thread.regs.s;
                    let args: Vec<Object> = (0..arg_count).map(|i| self.thread.stack.index(s, i)).collect();
                    let result = procs.call(proc_id, ArgView::new(&args), &self.heap)?;
                    self.thread.regs.a = result;
                    self.thread.regs.s = s - arg_count;
                    self.thread.regs.x = next;
                }
            }
        }
    }

    /// `c.vec[1 + n]`, typechecked when `config.typecheck` is set. Used by
    /// both `ReferFree` and `AssignFree` (the latter then `set_box`es the
    /// cell this returns).
    fn closure_slot(&self, c: Object, n: usize) -> Result<Object, ThreeImpError> {
        if self.config.typecheck && !c.is_closure() {
            return Err(ThreeImpError::runtime_type(format!(
                "refer-free: current closure register holds a {}",
                c.kind()
            )));
        }
        closure_free(c)
            .get(n)
            .copied()
            .ok_or_else(|| ThreeImpError::runtime_lookup(format!("free-variable slot {n} out of range")))
    }

    fn assign_box(&self, cell: Object) -> Result<(), ThreeImpError> {
        if self.config.typecheck && !cell.is_box() {
            return Err(ThreeImpError::runtime_type(format!("assign: expected a box, found a {}", cell.kind())));
        }
        set_box(cell, self.thread.regs.a);
        Ok(())
    }

    /// Allocate a `Vector` of `n_free + 1` slots: slot 0 the entry id, slots
    /// `1..` the top `n_free` stack values in order. Shared by the `Close` instruction and by `continuation`,
    /// which builds a zero-free-variable closure over a synthesized body.
    fn build_closure(&self, body: VmExpId, n_free: usize, s: usize) -> Result<Object, ThreeImpError> {
        let mut captured = Vec::with_capacity(n_free);
        for i in 0..n_free {
            captured.push(self.thread.stack.index(s, i));
        }
        let entry = Object::integer(body as i64)?;
        make_closure(&self.heap, entry, captured)
    }

    /// `continuation(s)`: a zero-argument closure whose body reinstates the
    /// saved stack then returns the accumulator unchanged. Built by `Conti`;
    /// grounded on `ss-core/vm.cc`'s `continuation`, which synthesizes
    /// these three instructions into the shared pool the first time a
    /// `call/cc` actually captures.
    fn continuation(&mut self, code: &mut VCode, s: usize) -> Result<Object, ThreeImpError> {
        let saved = self.save_stack(s)?;
        let ret = code.new_vmx_return(0);
        let nuate = code.new_vmx_nuate(saved, ret);
        let refer = code.new_vmx_refer_local(0, nuate);
        self.build_closure(refer, 0, s)
    }

    fn save_stack(&self, s: usize) -> Result<Object, ThreeImpError> {
        make_vector(&self.heap, self.thread.stack.prefix(s).to_vec())
    }

    fn restore_stack(&mut self, saved: Object) -> Result<usize, ThreeImpError> {
        if self.config.typecheck && !saved.is_vector() {
            return Err(ThreeImpError::runtime_type(format!(
                "nuate: expected a saved-stack vector, found a {}",
                saved.kind()
            )));
        }
        let slots = vector_slots(saved);
        if slots.len() > self.thread.stack.capacity() {
            return Err(ThreeImpError::resource("cannot restore a stack larger than the VM stack's capacity"));
        }
        self.thread.stack.restore_prefix(slots);
        Ok(slots.len())
    }

    /// Tail-call detection's payoff: copy the top `n` argument slots down
    /// by `m` positions, overwriting the caller's frame.
    fn shift_args(&mut self, n: usize, m: usize, s: usize) -> usize {
        for i in (0..n).rev() {
            let v = self.thread.stack.index(s, i);
            self.thread.stack.index_set(s, i + m, v);
        }
        s - m
    }
}
