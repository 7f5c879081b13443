//! Operations and the per-invocation call context.
//!
//! An operation that overrides one of its parent's keeps a reference to the
//! parent version. The reference is handed to the body through [`Call`]
//! and lives exactly as long as that one invocation: nested or recursive
//! invocations build their own `Call` and see their own parent.

use std::fmt;
use std::sync::Arc;

use crate::error::ClassError;
use crate::object::Instance;
use crate::value::Value;

type OperationFn = dyn Fn(&mut Call<'_>) -> Result<Value, ClassError> + Send + Sync;

/// A callable class member, possibly chained to the parent version it
/// overrides.
#[derive(Clone)]
pub struct Operation {
    inner: Arc<OperationInner>,
}

struct OperationInner {
    body: Arc<OperationFn>,
    parent: Option<Operation>,
}

impl Operation {
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(&mut Call<'_>) -> Result<Value, ClassError> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(OperationInner {
                body: Arc::new(body),
                parent: None,
            }),
        }
    }

    /// This operation's body, chained over `parent`.
    ///
    /// Any parent this operation already had is replaced, so chaining an own
    /// member over the parent's effective member always yields exactly one
    /// link per class in the lineage.
    pub(crate) fn chained(&self, parent: &Operation) -> Operation {
        Operation {
            inner: Arc::new(OperationInner {
                body: Arc::clone(&self.inner.body),
                parent: Some(parent.clone()),
            }),
        }
    }

    /// The overridden parent version, if any.
    pub fn parent(&self) -> Option<&Operation> {
        self.inner.parent.as_ref()
    }

    /// Number of bodies in the chain, this one included.
    pub fn depth(&self) -> usize {
        1 + self.inner.parent.as_ref().map_or(0, Operation::depth)
    }

    /// Whether two operations run the same body (ignoring chaining).
    pub fn same_body(&self, other: &Operation) -> bool {
        Arc::ptr_eq(&self.inner.body, &other.inner.body)
    }

    pub(crate) fn invoke(
        &self,
        name: &str,
        instance: &mut Instance,
        args: &[Value],
    ) -> Result<Value, ClassError> {
        let mut call = Call {
            operation: name,
            instance,
            args,
            parent: self.inner.parent.as_ref(),
        };
        (self.inner.body)(&mut call)
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("depth", &self.depth())
            .finish()
    }
}

/// Context of one operation invocation.
pub struct Call<'a> {
    operation: &'a str,
    instance: &'a mut Instance,
    args: &'a [Value],
    parent: Option<&'a Operation>,
}

impl Call<'_> {
    /// Name the operation was invoked under.
    pub fn name(&self) -> &str {
        self.operation
    }

    pub fn instance(&self) -> &Instance {
        self.instance
    }

    pub fn instance_mut(&mut self) -> &mut Instance {
        self.instance
    }

    pub fn args(&self) -> &[Value] {
        self.args
    }

    /// Positional argument, `Null` when absent.
    pub fn arg(&self, index: usize) -> &Value {
        const NULL: Value = Value::Null;
        self.args.get(index).unwrap_or(&NULL)
    }

    /// Whether this invocation overrides a parent version.
    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    /// Invoke the parent version with the same arguments.
    pub fn call_parent(&mut self) -> Result<Value, ClassError> {
        let args = self.args;
        self.call_parent_with(args)
    }

    /// Invoke the parent version with different arguments.
    pub fn call_parent_with(&mut self, args: &[Value]) -> Result<Value, ClassError> {
        let parent = self
            .parent
            .ok_or_else(|| ClassError::NoParentOperation(self.operation.to_string()))?;
        parent.invoke(self.operation, self.instance, args)
    }
}
