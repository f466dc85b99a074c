//! Method binding

use std::sync::Arc;

use tether_types::TypeId;

use crate::builder::BuildContext;
use crate::proxy::{MethodStub, Proxy};

impl BuildContext<'_> {
    /// Bind the exported methods of `ty` into the proxy's `methods` table
    ///
    /// Each method gets one stub, registered under every name it resolves
    /// to. In eager mode the receiver, parameter and result types of each
    /// method are preprocessed.
    pub(crate) fn add_methods(&self, ty: TypeId, proxy: &mut Proxy, ptr_receiver: bool) {
        for method in self.types.method_set(ty) {
            if !method.def.is_exported() {
                continue;
            }

            let names = self.config.method_names(self.types, ty, &method);
            let call = self.accessors.bind_method(self.types, &method, ptr_receiver);
            let signature: Vec<TypeId> = method.def.signature_types().collect();
            let stub = Arc::new(MethodStub {
                method,
                ptr_receiver,
                call,
            });
            for name in names {
                proxy.insert_method(name, Arc::clone(&stub));
            }

            if self.config.preprocess() {
                self.preprocess(ty);
                for sig_ty in signature {
                    self.preprocess(sig_ty);
                }
            }
        }
    }
}
