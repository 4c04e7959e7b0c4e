mod storage {
    pub trait Backend {
        #[unsupported_operation]
        fn flush(&mut self);

        #[unsupported_operation(error = "crate.storage.errors.ReadOnly", pass_owner = true)]
        fn compact(&mut self) -> usize {
            0
        }
    }

    pub mod memory {
        pub struct Memory;

        impl super::Backend for Memory {
            #[unsupported_operation(message = "memory backend keeps nothing")]
            fn flush(&mut self) {}
        }
    }
}
