// Copyright (c) 2022 MASSA LABS <info@massa.net>

pub mod tools;
